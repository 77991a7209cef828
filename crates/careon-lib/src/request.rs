use log::debug;

use crate::error::{PortalError, Result};
use crate::identity::Identity;
use crate::staging::{FileStaging, StagedFile};

pub const MANDATORY_SIGNAL_MISSING: &str =
    "mandatory signal missing: stage at least an ECG or EEG strip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(StagedFile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: &'static str,
    pub value: FormValue,
}

/// Transport-neutral multipart payload; the HTTP client turns it into a wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name,
            value: FormValue::Text(value.into()),
        });
        self
    }

    pub fn file(mut self, name: &'static str, file: StagedFile) -> Self {
        self.parts.push(FormPart {
            name,
            value: FormValue::File(file),
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parts.iter().map(|part| part.name).collect()
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match &part.value {
            FormValue::Text(value) if part.name == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn file_value(&self, name: &str) -> Option<&StagedFile> {
        self.parts.iter().find_map(|part| match &part.value {
            FormValue::File(file) if part.name == name => Some(file),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

pub fn registration_form(identity: &Identity) -> MultipartForm {
    let age = identity.age.map(|age| age.to_string()).unwrap_or_default();
    MultipartForm::new()
        .text("full_name", identity.full_name.clone())
        .text("email", identity.email.clone())
        .text("age", age)
        .text("password", identity.password.clone())
}

/// Email plus every occupied slot. Refuses to build without an ECG or EEG strip.
pub fn analysis_form(identity: &Identity, staging: &FileStaging) -> Result<MultipartForm> {
    if !staging.has_mandatory_signal() {
        return Err(PortalError::Validation(MANDATORY_SIGNAL_MISSING.into()));
    }
    let mut form = MultipartForm::new().text("email", identity.email.clone());
    for (slot, file) in staging.staged() {
        form = form.file(slot.field_name(), file.clone());
    }
    debug!("analysis form built with parts {:?}", form.names());
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityField;
    use crate::staging::Slot;

    fn identity() -> Identity {
        let mut identity = Identity::new();
        identity.set(IdentityField::FullName, "Pat Doe").unwrap();
        identity.set(IdentityField::Email, "pat@example.org").unwrap();
        identity.set(IdentityField::Password, "secret").unwrap();
        identity
    }

    fn file(name: &str) -> StagedFile {
        StagedFile::new(name, "image/png", vec![1, 2, 3])
    }

    #[test]
    fn registration_sends_empty_age_when_absent() {
        let form = registration_form(&identity());
        assert_eq!(form.names(), vec!["full_name", "email", "age", "password"]);
        assert_eq!(form.text_value("age"), Some(""));
        assert_eq!(form.text_value("full_name"), Some("Pat Doe"));
    }

    #[test]
    fn analysis_contains_exactly_staged_slots() {
        let mut staging = FileStaging::new();
        staging.stage(Slot::MriCurrent, file("current.png"));
        staging.stage(Slot::EegStrip, file("eeg.png"));
        let form = analysis_form(&identity(), &staging).unwrap();
        assert_eq!(form.names(), vec!["email", "eeg_strip", "mri_current"]);
        assert_eq!(form.text_value("email"), Some("pat@example.org"));
        assert_eq!(form.file_value("eeg_strip").unwrap().file_name, "eeg.png");
        assert!(form.file_value("ecg_strip").is_none());
    }

    #[test]
    fn every_slot_combination_respects_the_signal_guard() {
        for mask in 0u8..16 {
            let mut staging = FileStaging::new();
            for (bit, slot) in Slot::ALL.into_iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    staging.stage(slot, file(slot.field_name()));
                }
            }
            let has_signal = mask & 0b11 != 0;
            match analysis_form(&identity(), &staging) {
                Ok(form) => {
                    assert!(has_signal, "mask {:04b} should have been refused", mask);
                    let mut expected = vec!["email"];
                    expected.extend(staging.staged().map(|(slot, _)| slot.field_name()));
                    assert_eq!(form.names(), expected);
                }
                Err(err) => {
                    assert!(!has_signal, "mask {:04b} should have built", mask);
                    assert!(err.is_validation());
                }
            }
        }
    }
}
