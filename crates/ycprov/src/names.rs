//! Random display names, usernames and phone numbers for generated users

use crate::error::{CliError, CliResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

const MAX_USERNAME_LEN: usize = 12;
const MAX_ATTEMPTS: usize = 1000;

const FANTASY_GIVEN: &[&str] = &[
    "Aragorn", "Gandalf", "Frodo", "Samwise", "Pippin", "Merry", "Legolas", "Gimli", "Boromir",
    "Faramir", "Eowyn", "Arwen", "Galadriel", "Elrond", "Thranduil", "Bilbo", "Thorin", "Balin",
    "Dwalin", "Fili", "Kili", "Gloin", "Oin", "Ori", "Dori", "Nori", "Bifur", "Bofur", "Bombur",
    "Smaug", "Gollum", "Saruman", "Grima", "Theoden", "Eomer", "Haldir",
];

const FANTASY_FAMILY: &[&str] = &[
    "Baggins", "Took", "Brandybuck", "Gamgee", "Strider", "Greyhame", "Greenleaf", "Oakenshield",
    "Ironfoot", "SonofThrain", "SonofGloin", "Evenstar", "Rivendell", "Lorien", "Mirkwood",
    "Gondor", "Rohan", "Shire", "Mordor", "Isengard", "Helms", "Deep", "Woodland", "Erebor",
    "Moria", "Laketown", "Esgaroth", "Dale",
];

const CLASSIC_GIVEN: &[&str] = &[
    "Pierre", "Andrei", "Natasha", "Marya", "Nikolai", "Sonya", "Anatole", "Helene", "Vasily",
    "Anna", "Boris", "Dolokhov", "Kutuzov", "Bagration", "Denisov", "Rostov", "Napoleon",
    "Alexander", "Mikhail", "Vera", "Liza", "Petya", "Ilya", "Agafya", "Praskovya", "Dmitri",
    "Fyodor", "Ivan", "Sergei", "Vladimir", "Konstantin", "Pavel",
];

const CLASSIC_FAMILY: &[&str] = &[
    "Bezukhov", "Bolkonsky", "Rostov", "Kuragin", "Drubetskoy", "Karagin", "Mamonov", "Berg",
    "Dolokhov", "Zherkov", "Denisov", "Kutuzov", "Bagration", "Napoleon", "Alexander", "Smirnov",
    "Ivanov", "Petrov", "Sokolov", "Popov", "Volkov", "Novikov", "Fedorov", "Morozov",
    "Alekseev", "Lebedev", "Semenov", "Egorov", "Pavlov", "Kozlov", "Stepanov", "Nikolaev",
    "Orlov", "Andreev", "Makarov", "Nikitin", "Zakharov", "Zaitsev", "Solovyov", "Borisov",
    "Yakovlev",
];

/// Hands out given/family name pairs, never the same pair twice
pub struct NameGenerator {
    rng: StdRng,
    used: HashSet<(String, String)>,
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl NameGenerator {
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            used: HashSet::new(),
        }
    }

    pub fn generate_unique_name(&mut self) -> CliResult<(String, String)> {
        for _ in 0..MAX_ATTEMPTS {
            let (given_pool, family_pool) = if self.rng.gen_bool(0.5) {
                (FANTASY_GIVEN, FANTASY_FAMILY)
            } else {
                (CLASSIC_GIVEN, CLASSIC_FAMILY)
            };
            let (Some(given), Some(family)) = (
                given_pool.choose(&mut self.rng),
                family_pool.choose(&mut self.rng),
            ) else {
                continue;
            };

            let pair = (given.to_string(), family.to_string());
            if self.used.insert(pair.clone()) {
                return Ok(pair);
            }
        }
        Err(CliError::invalid("Unable to generate a unique name combination"))
    }
}

/// `givenfamily` lowercased, cut to 12 characters, then `@domain`.
///
/// The local part always starts with a letter and ends with a letter or digit.
pub fn generate_username(given_name: &str, family_name: &str, domain: &str) -> String {
    let mut base: String = format!("{}{}", given_name, family_name)
        .to_lowercase()
        .chars()
        .take(MAX_USERNAME_LEN)
        .collect();

    if !base.chars().last().is_some_and(|c| c.is_alphanumeric()) {
        base = format!("{}1", base.trim_end_matches(['_', '-']));
    }
    if !base.chars().next().is_some_and(|c| c.is_alphabetic()) {
        base = format!("user{}", base);
    }

    format!("{}@{}", base, domain)
}

/// Placeholder phone number unique per user index
pub fn phone_number(index: u32) -> String {
    format!("+1555{:07}", index)
}

/// Personal folder name, e.g. `frodo-baggins`
pub fn folder_name(given_name: &str, family_name: &str) -> String {
    format!("{}-{}", given_name.to_lowercase(), family_name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_truncated_to_twelve() {
        assert_eq!(
            generate_username("Galadriel", "Evenstar", "example.org"),
            "galadrieleve@example.org"
        );
        assert_eq!(generate_username("Oin", "Took", "d.net"), "ointook@d.net");
    }

    #[test]
    fn test_username_forced_to_end_alphanumeric() {
        assert_eq!(generate_username("Ann-", "", "d.net"), "ann1@d.net");
        assert_eq!(generate_username("abcdefghijk", "_x", "d.net"), "abcdefghijk1@d.net");
    }

    #[test]
    fn test_username_forced_to_start_with_letter() {
        assert_eq!(generate_username("7of", "Nine", "d.net"), "user7ofnine@d.net");
    }

    #[test]
    fn test_phone_number_padding() {
        assert_eq!(phone_number(0), "+15550000000");
        assert_eq!(phone_number(42), "+15550000042");
    }

    #[test]
    fn test_names_are_unique() {
        let mut names = NameGenerator::with_rng(StdRng::seed_from_u64(7));
        let mut seen = HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(names.generate_unique_name().unwrap()));
        }
    }

    #[test]
    fn test_folder_name() {
        assert_eq!(folder_name("Frodo", "Baggins"), "frodo-baggins");
    }
}
