use std::{
    fmt::{self, Display},
    str::FromStr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sex {
    Male,
    Female,
    Neuter,
    #[default]
    Unknown,
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "m" | "male" | "1" => Self::Male,
            "f" | "female" | "2" => Self::Female,
            "n" | "neuter" | "neither" => Self::Neuter,
            _ => Self::Unknown,
        })
    }
}

impl Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Neuter => "N",
            Self::Unknown => "U",
        })
    }
}
