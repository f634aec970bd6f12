// src/models/hall.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

// Mapeia o CREATE TYPE hall_id do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "hall_id", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Hall {
    Hall1,
    Hall2,
}

impl Hall {
    pub const ALL: [Hall; 2] = [Hall::Hall1, Hall::Hall2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hall::Hall1 => "hall1",
            Hall::Hall2 => "hall2",
        }
    }

    // Posição fixa do salão, usada para indexar estruturas por salão
    pub(crate) fn index(&self) -> usize {
        match self {
            Hall::Hall1 => 0,
            Hall::Hall2 => 1,
        }
    }
}

impl fmt::Display for Hall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Salão desconhecido: '{0}'")]
pub struct UnknownHall(pub String);

impl FromStr for Hall {
    type Err = UnknownHall;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hall1" => Ok(Hall::Hall1),
            "hall2" => Ok(Hall::Hall2),
            other => Err(UnknownHall(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Hall1".parse::<Hall>().unwrap(), Hall::Hall1);
        assert_eq!(" hall2 ".parse::<Hall>().unwrap(), Hall::Hall2);
        assert!("hall3".parse::<Hall>().is_err());
    }

    #[test]
    fn serializes_as_lowercase_identifier() {
        assert_eq!(serde_json::to_string(&Hall::Hall2).unwrap(), "\"hall2\"");
        assert_eq!(Hall::Hall1.to_string(), "hall1");
    }

    #[test]
    fn every_hall_has_its_own_slot() {
        for (position, hall) in Hall::ALL.iter().enumerate() {
            assert_eq!(hall.index(), position);
            assert_eq!(hall.as_str().parse::<Hall>().unwrap(), *hall);
        }
    }
}
