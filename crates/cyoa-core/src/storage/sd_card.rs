extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use embedded_sdmmc::{BlockDevice, Error, Mode, TimeSource, Timestamp, VolumeIdx, VolumeManager};
use log::debug;

use crate::assets::AssetSource;
use crate::error::StoryError;

/// Reads are blocking, like the display transfers that share the SPI bus.
///
/// Every read opens the volume, walks to the story directory and closes it
/// all again, so no FAT handles stay open between cards.
pub struct SdCardSource<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    volume_mgr: VolumeManager<D, T, 4, 4, 1>,
    story_dir: String,
}

impl<D, T> SdCardSource<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    /// `story_dir` is a directory in the card's root; empty means the root
    /// itself.
    pub fn new(device: D, time_source: T, story_dir: &str) -> Self {
        Self {
            volume_mgr: VolumeManager::new(device, time_source),
            story_dir: story_dir.to_string(),
        }
    }

    pub fn story_dir(&self) -> &str {
        &self.story_dir
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>, Error<D::Error>> {
        let volume0 = self.volume_mgr.open_volume(VolumeIdx(0))?;
        let root_dir = volume0.open_root_dir()?;

        let bytes = if self.story_dir.is_empty() {
            read_all(&root_dir, name)?
        } else {
            let story_dir = root_dir.open_dir(self.story_dir.as_str())?;
            let bytes = read_all(&story_dir, name)?;
            story_dir.close()?;
            bytes
        };

        root_dir.close()?;
        volume0.close()?;

        Ok(bytes)
    }
}

fn read_all<D, T, const MD: usize, const MF: usize, const MV: usize>(
    dir: &embedded_sdmmc::Directory<'_, D, T, MD, MF, MV>,
    name: &str,
) -> Result<Vec<u8>, Error<D::Error>>
where
    D: BlockDevice,
    T: TimeSource,
{
    let file = dir.open_file_in_dir(name, Mode::ReadOnly)?;
    let mut data = vec![0u8; file.length() as usize];

    let mut filled = 0;
    while filled < data.len() {
        match file.read(&mut data[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    data.truncate(filled);

    file.close()?;
    Ok(data)
}

impl<D, T> AssetSource for SdCardSource<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    fn read(&mut self, name: &str) -> Result<Vec<u8>, StoryError> {
        debug!("Reading {}/{} from SD card", self.story_dir, name);
        self.read_file(name).map_err(|e| match e {
            Error::NotFound => StoryError::asset(name, "file not found"),
            Error::FilenameError(_) => StoryError::asset(name, "not a valid 8.3 file name"),
            other => StoryError::asset(name, format!("{:?}", other)),
        })
    }
}

/// Clock for a read-only FAT volume. Nothing is written, so every timestamp
/// is the FAT epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTimeSource;

impl TimeSource for FixedTimeSource {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 10,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}
