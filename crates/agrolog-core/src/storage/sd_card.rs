//! SD card implementation of the log medium via `embedded-sdmmc`.

use embedded_sdmmc::{Error as SdError, Mode, SdCard, SdCardError, TimeSource, VolumeIdx, VolumeManager};

use crate::storage::LogMedium;

/// SD card operations are blocking. Every call opens the volume, the root
/// directory, and the file, and closes them again before returning, so the
/// handle is held for the shortest possible window and a crash between
/// appends can only lose the in-flight line.
pub struct SdCardMedium<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    volume_mgr: VolumeManager<SdCard<S, D>, T, 4, 4, 1>,
}

impl<S, D, T> SdCardMedium<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    pub fn new(sd_card: SdCard<S, D>, time_source: T) -> Self {
        Self {
            volume_mgr: VolumeManager::new(sd_card, time_source),
        }
    }
}

impl<S, D, T> LogMedium for SdCardMedium<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    type Error = SdError<SdCardError>;

    fn mount(&mut self) -> Result<(), Self::Error> {
        // Opening the first partition is the cheapest end-to-end probe of
        // card presence and readability.
        let volume = self.volume_mgr.open_volume(VolumeIdx(0))?;
        volume.close()?;
        Ok(())
    }

    fn exists(&mut self, name: &str) -> Result<bool, Self::Error> {
        let volume = self.volume_mgr.open_volume(VolumeIdx(0))?;
        let root_dir = volume.open_root_dir()?;

        let found = match root_dir.find_directory_entry(name) {
            Ok(_) => true,
            Err(SdError::NotFound) => false,
            Err(e) => {
                root_dir.close()?;
                volume.close()?;
                return Err(e);
            }
        };

        root_dir.close()?;
        volume.close()?;
        Ok(found)
    }

    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), Self::Error> {
        let volume = self.volume_mgr.open_volume(VolumeIdx(0))?;
        let root_dir = volume.open_root_dir()?;

        // Creates the file on first use; appends afterwards.
        let file = root_dir.open_file_in_dir(name, Mode::ReadWriteCreateOrAppend)?;
        file.write(data)?;

        // Resources are closed on drop (RAII), but closing explicitly
        // surfaces any flush error instead of swallowing it.
        file.close()?;
        root_dir.close()?;
        volume.close()?;

        Ok(())
    }
}
