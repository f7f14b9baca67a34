//! Sector management flow behind the `sectors` commands.
//!
//! # Responsibility
//! - Trim operator input before it reaches the repository.
//! - Turn repository results into the messages shown to the operator.
//! - Ask for confirmation before a delete.
//!
//! # Invariants
//! - Messages are chosen by error variant, never by matching error text.
//! - Works against any [`SectorRepository`], so tests run without storage.

use log::{info, warn};
use moneymonkey_core::{RepoError, SectorRepository};
use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};

pub const DUPLICATE_NAME_MESSAGE: &str = "Sector with this name already exists.";

/// Outcome of one admin action, as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Success(String),
    Error(String),
}

impl Feedback {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl Display for Feedback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success(message) | Self::Error(message) => f.write_str(message),
        }
    }
}

pub struct SectorAdmin<'r, R: SectorRepository> {
    repo: &'r R,
}

impl<'r, R: SectorRepository> SectorAdmin<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Returns sector names, or the retrieval error message.
    pub fn list(&self) -> Result<Vec<String>, Feedback> {
        self.repo
            .list_sectors()
            .map_err(|err| Feedback::Error(format!("Error retrieving sectors: {err}")))
    }

    pub fn add(&self, name: &str) -> Feedback {
        let name = name.trim();
        match self.repo.create_sector(name) {
            Ok(()) => {
                info!("event=admin_sector_add module=cli status=ok name={name}");
                Feedback::Success("Sector added successfully!".to_string())
            }
            Err(err) => failure("adding", name, &err),
        }
    }

    pub fn rename(&self, old_name: &str, new_name: &str) -> Feedback {
        let old_name = old_name.trim();
        let new_name = new_name.trim();
        match self.repo.update_sector(old_name, new_name) {
            Ok(()) => {
                info!(
                    "event=admin_sector_rename module=cli status=ok old={old_name} new={new_name}"
                );
                Feedback::Success("Sector renamed successfully.".to_string())
            }
            Err(err) => failure("editing", old_name, &err),
        }
    }

    pub fn delete(&self, name: &str) -> Feedback {
        let name = name.trim();
        match self.repo.delete_sector(name) {
            Ok(()) => {
                info!("event=admin_sector_delete module=cli status=ok name={name}");
                Feedback::Success(format!("Sector '{name}' deleted."))
            }
            Err(err) => failure("deleting", name, &err),
        }
    }
}

/// Asks whether `name` should be deleted; only `y` or `yes` confirms.
pub fn confirm_delete<I: BufRead, O: Write>(
    name: &str,
    input: &mut I,
    output: &mut O,
) -> io::Result<bool> {
    write!(output, "Are you sure you want to delete '{}'? [y/N] ", name.trim())?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn failure(action: &str, name: &str, err: &RepoError) -> Feedback {
    warn!("event=admin_sector_{action} module=cli status=error name={name} error={err}");
    let message = match err {
        RepoError::AlreadyExists { .. } => DUPLICATE_NAME_MESSAGE.to_string(),
        RepoError::StillReferenced { name, .. } => format!(
            "Sector '{name}' still has industries assigned; move or delete them first."
        ),
        other => format!("Error {action} sector: {other}"),
    };
    Feedback::Error(message)
}

#[cfg(test)]
mod tests {
    use super::{confirm_delete, Feedback, SectorAdmin, DUPLICATE_NAME_MESSAGE};
    use moneymonkey_core::{InMemorySectorRepository, SectorRepository};

    #[test]
    fn add_trims_input_and_reports_success() {
        let repo = InMemorySectorRepository::new();
        let admin = SectorAdmin::new(&repo);

        let feedback = admin.add("  Energy \n");

        assert_eq!(
            feedback,
            Feedback::Success("Sector added successfully!".to_string())
        );
        assert_eq!(repo.list_sectors().unwrap(), vec!["Energy".to_string()]);
    }

    #[test]
    fn duplicate_add_shows_the_fixed_message() {
        let repo = InMemorySectorRepository::with_sectors(["Energy"]).unwrap();

        let feedback = SectorAdmin::new(&repo).add("Energy ");

        assert_eq!(feedback, Feedback::Error(DUPLICATE_NAME_MESSAGE.to_string()));
    }

    #[test]
    fn duplicate_rename_shows_the_fixed_message() {
        let repo = InMemorySectorRepository::with_sectors(["Energy", "Utilities"]).unwrap();

        let feedback = SectorAdmin::new(&repo).rename("Energy", " Utilities");

        assert_eq!(feedback, Feedback::Error(DUPLICATE_NAME_MESSAGE.to_string()));
    }

    #[test]
    fn rename_and_delete_report_success() {
        let repo = InMemorySectorRepository::with_sectors(["Energy"]).unwrap();
        let admin = SectorAdmin::new(&repo);

        assert_eq!(
            admin.rename(" Energy", "Power "),
            Feedback::Success("Sector renamed successfully.".to_string())
        );
        assert_eq!(
            admin.delete("Power"),
            Feedback::Success("Sector 'Power' deleted.".to_string())
        );
        assert!(admin.list().unwrap().is_empty());
    }

    #[test]
    fn referenced_sector_gets_a_specific_message() {
        let repo = InMemorySectorRepository::with_sectors(["Energy"]).unwrap();
        repo.add_industry("Energy").unwrap();

        let feedback = SectorAdmin::new(&repo).delete("Energy");

        assert!(feedback.is_error());
        assert!(feedback.to_string().contains("still has industries"));
    }

    #[test]
    fn other_failures_name_the_action() {
        let repo = InMemorySectorRepository::with_sectors(["Energy"]).unwrap();
        let admin = SectorAdmin::new(&repo);

        let invalid = admin.add("E");
        assert!(invalid.to_string().starts_with("Error adding sector: "));

        let missing = admin.rename("Materials", "Metals");
        assert!(missing.to_string().starts_with("Error editing sector: "));

        repo.fail_writes(Some("disk full"));
        let storage = admin.delete("Energy");
        assert!(storage.to_string().starts_with("Error deleting sector: "));
        assert!(storage.to_string().contains("disk full"));
    }

    #[test]
    fn delete_confirmation_accepts_only_yes() {
        for (answer, expected) in [("y\n", true), ("YES\n", true), ("\n", false), ("no\n", false)] {
            let mut output = Vec::new();
            let confirmed =
                confirm_delete(" Energy", &mut answer.as_bytes(), &mut output).unwrap();
            assert_eq!(confirmed, expected, "answer {answer:?}");
            assert_eq!(
                String::from_utf8(output).unwrap(),
                "Are you sure you want to delete 'Energy'? [y/N] "
            );
        }
    }
}
