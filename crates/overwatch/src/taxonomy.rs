use serde::{Deserialize, Serialize};

use crate::category::category_enum;
use crate::classify::{ClassificationTable, NamedRule, TagRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingAi {
    Cemetery,
    LandfillSite,
    FireStation,
    PoliceStation,
    Hospital,
    Park,
    PowerPlant,
    PlayerOther,
    Residential,
    Commercial,
    Industrial,
    Office,
    PrivateOther,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleAi {
    CarTrailer,
    Hearse,
    GarbageTruck,
    FireTruck,
    PoliceCar,
    Ambulance,
    Bus,
    CarOther,
    PassengerTrain,
    MetroTrain,
    CargoTrain,
    TrainOther,
    Aircraft,
    Ship,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CitizenAi {
    Bird,
    Livestock,
    Pet,
    Wildlife,
    AnimalOther,
    Resident,
    ServicePerson,
    Tourist,
    HumanOther,
}

impl CitizenAi {
    pub fn is_animal(self) -> bool {
        matches!(
            self,
            Self::Bird | Self::Livestock | Self::Pet | Self::Wildlife | Self::AnimalOther
        )
    }
}

category_enum! {
    pub enum BuildingCategory {
        All => ("Total", 0),
        Player => ("Player Building(s)", 1),
        Cemeteries => ("Cemetery(s)", 2),
        LandfillSites => ("LandfillSite(s)", 2),
        FireStations => ("FireStation(s)", 2),
        PoliceStations => ("PoliceStation(s)", 2),
        Hospitals => ("Hospital(s)", 2),
        Parks => ("Park(s)", 2),
        PowerPlants => ("PowerPlant(s)", 2),
        PlayerOther => ("Other", 2),
        Private => ("Private Building(s)", 1),
        Residential => ("Residential", 2),
        Commercial => ("Commercial", 2),
        Industrial => ("Industrial", 2),
        Office => ("Office(s)", 2),
        PrivateOther => ("Other", 2),
        Other => ("Other Building(s)", 1),
    }
}

category_enum! {
    /// Instance state of a building, refreshed on every visit.
    pub enum BuildingCondition {
        Abandoned => ("Abandoned", 0),
        BurnedDown => ("BurnedDown", 0),
        WithDead => ("w/Death", 0),
        WithGarbage => ("w/Garbage", 0),
        WithFire => ("w/Fire", 0),
        WithCrime => ("w/Crime", 0),
        WithIllness => ("w/Illness", 0),
        CapacityStep1 => ("CapacityStep1", 0),
        CapacityStep2 => ("CapacityStep2", 0),
        CapacityFull => ("CapacityFull", 0),
    }
}

category_enum! {
    pub enum VehicleCategory {
        All => ("Total", 0),
        Cars => ("Car(s)", 1),
        Hearses => ("Hearse(s)", 2),
        GarbageTrucks => ("Garbage Truck(s)", 2),
        FireTrucks => ("Fire Truck(s)", 2),
        PoliceCars => ("Police Car(s)", 2),
        Ambulances => ("Ambulance(s)", 2),
        Buses => ("Bus(s)", 2),
        CarOther => ("Other", 2),
        Trains => ("Train(s)", 1),
        PassengerTrains => ("Passenger Train(s)", 2),
        MetroTrains => ("Metro Train(s)", 2),
        CargoTrains => ("Cargo Train(s)", 2),
        TrainOther => ("Other", 2),
        Aircraft => ("Aircraft", 1),
        Ships => ("Ship(s)", 1),
        Other => ("Other", 1),
    }
}

category_enum! {
    pub enum AnimalCategory {
        All => ("Total", 0),
        Birds => ("Bird(s)", 1),
        Seagulls => ("Seagull(s)", 2),
        Livestock => ("Livestock", 1),
        Cows => ("Cow(s)", 2),
        Pigs => ("Pig(s)", 2),
        Pets => ("Pet(s)", 1),
        Dogs => ("Dog(s)", 2),
        Wildlife => ("Wildlife", 1),
        Wolves => ("Wolf(s)", 2),
        Bears => ("Bear(s)", 2),
        Moose => ("Moose", 2),
        Other => ("Other", 1),
    }
}

macro_rules! rule {
    ($tag:expr => [$($category:expr),+ $(,)?]) => {
        TagRule {
            tag: $tag,
            categories: &[$($category),+],
        }
    };
}

pub static BUILDING_TABLE: ClassificationTable<BuildingAi, BuildingCategory> = {
    use BuildingAi as Ai;
    use BuildingCategory as C;
    ClassificationTable {
        rules: &[
            rule!(Ai::Cemetery => [C::All, C::Player, C::Cemeteries]),
            rule!(Ai::LandfillSite => [C::All, C::Player, C::LandfillSites]),
            rule!(Ai::FireStation => [C::All, C::Player, C::FireStations]),
            rule!(Ai::PoliceStation => [C::All, C::Player, C::PoliceStations]),
            rule!(Ai::Hospital => [C::All, C::Player, C::Hospitals]),
            rule!(Ai::Park => [C::All, C::Player, C::Parks]),
            rule!(Ai::PowerPlant => [C::All, C::Player, C::PowerPlants]),
            rule!(Ai::PlayerOther => [C::All, C::Player, C::PlayerOther]),
            rule!(Ai::Residential => [C::All, C::Private, C::Residential]),
            rule!(Ai::Commercial => [C::All, C::Private, C::Commercial]),
            rule!(Ai::Industrial => [C::All, C::Private, C::Industrial]),
            rule!(Ai::Office => [C::All, C::Private, C::Office]),
            rule!(Ai::PrivateOther => [C::All, C::Private, C::PrivateOther]),
            rule!(Ai::Other => [C::All, C::Other]),
        ],
        named: &[],
    }
};

pub static VEHICLE_TABLE: ClassificationTable<VehicleAi, VehicleCategory> = {
    use VehicleAi as Ai;
    use VehicleCategory as C;
    ClassificationTable {
        rules: &[
            rule!(Ai::CarTrailer => [C::All]),
            rule!(Ai::Hearse => [C::All, C::Cars, C::Hearses]),
            rule!(Ai::GarbageTruck => [C::All, C::Cars, C::GarbageTrucks]),
            rule!(Ai::FireTruck => [C::All, C::Cars, C::FireTrucks]),
            rule!(Ai::PoliceCar => [C::All, C::Cars, C::PoliceCars]),
            rule!(Ai::Ambulance => [C::All, C::Cars, C::Ambulances]),
            rule!(Ai::Bus => [C::All, C::Cars, C::Buses]),
            rule!(Ai::CarOther => [C::All, C::Cars, C::CarOther]),
            rule!(Ai::PassengerTrain => [C::All, C::Trains, C::PassengerTrains]),
            rule!(Ai::MetroTrain => [C::All, C::Trains, C::MetroTrains]),
            rule!(Ai::CargoTrain => [C::All, C::Trains, C::CargoTrains]),
            rule!(Ai::TrainOther => [C::All, C::Trains, C::TrainOther]),
            rule!(Ai::Aircraft => [C::All, C::Aircraft]),
            rule!(Ai::Ship => [C::All, C::Ships]),
            rule!(Ai::Other => [C::All, C::Other]),
        ],
        named: &[],
    }
};

/// Human tags have no rule and classify to nothing.
pub static ANIMAL_TABLE: ClassificationTable<CitizenAi, AnimalCategory> = {
    use AnimalCategory as C;
    use CitizenAi as Ai;
    ClassificationTable {
        rules: &[
            rule!(Ai::Bird => [C::All, C::Birds]),
            rule!(Ai::Livestock => [C::All, C::Livestock]),
            rule!(Ai::Pet => [C::All, C::Pets]),
            rule!(Ai::Wildlife => [C::All, C::Wildlife]),
            rule!(Ai::AnimalOther => [C::All, C::Other]),
        ],
        named: &[
            NamedRule {
                parent: C::Birds,
                display_name: "Seagull",
                category: C::Seagulls,
            },
            NamedRule {
                parent: C::Livestock,
                display_name: "Cow",
                category: C::Cows,
            },
            NamedRule {
                parent: C::Livestock,
                display_name: "Pig",
                category: C::Pigs,
            },
            NamedRule {
                parent: C::Pets,
                display_name: "Dog",
                category: C::Dogs,
            },
            NamedRule {
                parent: C::Wildlife,
                display_name: "Wolf",
                category: C::Wolves,
            },
            NamedRule {
                parent: C::Wildlife,
                display_name: "Bear",
                category: C::Bears,
            },
            NamedRule {
                parent: C::Wildlife,
                display_name: "MooseMale",
                category: C::Moose,
            },
            NamedRule {
                parent: C::Wildlife,
                display_name: "MooseFemale",
                category: C::Moose,
            },
        ],
    }
};
