use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::error::PortalError;

/// Fixed upload slots offered by the diagnostic portal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    EcgStrip,
    EegStrip,
    MriBaseline,
    MriCurrent,
}

impl Slot {
    /// Submission order used when building the analyze request.
    pub const ALL: [Slot; 4] = [
        Slot::EcgStrip,
        Slot::EegStrip,
        Slot::MriBaseline,
        Slot::MriCurrent,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            Slot::EcgStrip => "ecg_strip",
            Slot::EegStrip => "eeg_strip",
            Slot::MriBaseline => "mri_baseline",
            Slot::MriCurrent => "mri_current",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Slot::EcgStrip => "ECG Strip (Heart Rhythm)",
            Slot::EegStrip => "EEG Strip (Neural Activity)",
            Slot::MriBaseline => "Baseline MRI",
            Slot::MriCurrent => "Current MRI",
        }
    }

    /// ECG and EEG are the signals an analysis cannot run without.
    pub fn is_mandatory_signal(&self) -> bool {
        matches!(self, Slot::EcgStrip | Slot::EegStrip)
    }

    fn index(self) -> usize {
        match self {
            Slot::EcgStrip => 0,
            Slot::EegStrip => 1,
            Slot::MriBaseline => 2,
            Slot::MriCurrent => 3,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for Slot {
    type Err = PortalError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        Slot::ALL
            .into_iter()
            .find(|slot| slot.field_name() == name)
            .ok_or_else(|| PortalError::Validation(format!("unknown upload slot '{}'", name)))
    }
}

/// Opaque file handle waiting to be submitted. Contents are never inspected here.
#[derive(Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl StagedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.to_string())
            .with_context(|| format!("{} has no usable file name", path.display()))?;
        let content_type = guess_content_type(path).to_string();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("dcm") => "application/dicom",
        Some("nii") => "application/x-nifti",
        Some("gz") => "application/gzip",
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("edf") => "application/x-edf",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Default, Clone)]
pub struct FileStaging {
    slots: [Option<StagedFile>; 4],
}

impl FileStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `file` into `slot`, handing back whatever it replaced.
    pub fn stage(&mut self, slot: Slot, file: StagedFile) -> Option<StagedFile> {
        self.slots[slot.index()].replace(file)
    }

    pub fn clear(&mut self, slot: Slot) -> Option<StagedFile> {
        self.slots[slot.index()].take()
    }

    pub fn get(&self, slot: Slot) -> Option<&StagedFile> {
        self.slots[slot.index()].as_ref()
    }

    pub fn is_staged(&self, slot: Slot) -> bool {
        self.slots[slot.index()].is_some()
    }

    pub fn staged(&self) -> impl Iterator<Item = (Slot, &StagedFile)> + '_ {
        Slot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|file| (slot, file)))
    }

    pub fn has_mandatory_signal(&self) -> bool {
        Slot::ALL
            .into_iter()
            .any(|slot| slot.is_mandatory_signal() && self.is_staged(slot))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
