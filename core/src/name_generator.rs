//! Deterministic demographic fields for simulated accounts.
//!
//! Names come from short curated lists; emails are derived from the name
//! plus a numeric suffix so collisions stay rare without a uniqueness pass.
//! These fields carry no statistical meaning.

use crate::rng::StageRng;

const EMAIL_DOMAINS: [&str; 4] = ["example.com", "example.org", "example.net", "mail.example.com"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demographics {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: u32,
}

/// Deterministic name generator using curated name lists.
pub struct NameGenerator;

impl NameGenerator {
    pub fn first_name(rng: &mut StageRng) -> &'static str {
        pick(rng, FIRST_NAMES)
    }

    pub fn last_name(rng: &mut StageRng) -> &'static str {
        pick(rng, LAST_NAMES)
    }

    /// `first.last<n>@domain`, lower-cased, n in 1..=999.
    pub fn email(rng: &mut StageRng, first: &str, last: &str) -> String {
        let n = rng.int_inclusive(1, 999);
        let domain = pick(rng, &EMAIL_DOMAINS);
        format!(
            "{}.{}{n}@{domain}",
            first.to_ascii_lowercase(),
            last.to_ascii_lowercase()
        )
    }

    /// Full demographic block with age uniform in [min_age, max_age].
    pub fn demographics(rng: &mut StageRng, min_age: u32, max_age: u32) -> Demographics {
        let first = Self::first_name(rng);
        let last = Self::last_name(rng);
        let email = Self::email(rng, first, last);
        let age = rng.int_inclusive(i64::from(min_age), i64::from(max_age)) as u32;
        Demographics {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email,
            age,
        }
    }
}

fn pick(rng: &mut StageRng, list: &[&'static str]) -> &'static str {
    list[rng.next_u64_below(list.len() as u64) as usize]
}

const FIRST_NAMES: &[&str] = &[
    "Aiden", "Alicia", "Andre", "Bianca", "Caleb", "Camila", "Connor", "Dana", "Derek", "Elena",
    "Felix", "Fiona", "Gavin", "Greta", "Hector", "Imani", "Isaac", "Jada", "Jonah", "Kara",
    "Leon", "Lucia", "Malik", "Maya", "Miles", "Nadia", "Omar", "Paige", "Quinn", "Rosa",
    "Simon", "Tessa", "Trevor", "Uma", "Vince", "Wendy", "Xavier", "Yara", "Zane", "Zoe",
    "Brooke", "Colin", "Devon", "Erin", "Grant", "Hazel", "Ivan", "Jill", "Kyle", "Luz",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Barker", "Castillo", "Delgado", "Ellison", "Fischer", "Gallagher", "Haddad",
    "Ibarra", "Jensen", "Kowalski", "Lindqvist", "Maddox", "Nakamura", "Okafor", "Pruitt",
    "Quintero", "Rasmussen", "Sorensen", "Thibodeau", "Underwood", "Valdez", "Whitaker",
    "Xiong", "Yamada", "Zamora", "Brennan", "Caruso", "Donnelly", "Esposito", "Flanagan",
    "Greco", "Holloway", "Iverson", "Kaplan", "Lombardi", "Moriarty", "Novak", "Ostrowski",
    "Pellegrino", "Riordan", "Santangelo", "Tierney", "Vasquez", "Wojcik",
];
