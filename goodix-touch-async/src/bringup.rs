//! Bring-up sequencing: reset, probe, identification, variant resolution,
//! configuration upload and arming.

use embedded_hal::digital::PinState;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::blob::{self, ConfigBlob};
use crate::conf::ConfigSource;
use crate::error::Error;
use crate::hal::{AcquireError, FlexPin, InterruptLine, LineRole, PinProvider, Regulator, TouchSink};
use crate::power::PowerState;
use crate::reg::{
    cfg, timing, CONFIG_MAX_LENGTH, DEFAULT_MAX_X, DEFAULT_MAX_Y, ID_BLOCK_LEN, MAX_CONTACTS,
    MAX_SENSOR_ID, REG_ID, REG_SENSOR_ID,
};
use crate::report::TouchscreenProperties;
use crate::session::Session;
use crate::variant::{parse_chip_id, Trigger, VariantDescriptor};

const PROBE_ATTEMPTS: u8 = 2;

/// Progress of the bring-up sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringUpState {
    Unconfigured,
    GpioConfigured,
    Reset,
    BusVerified,
    VersionRead,
    VariantResolved,
    ConfigApplied,
    Running,
    /// A step failed; nothing acquired during the attempt is retained.
    Failed,
}

impl<I2C, P, IRQ, REG, S, D, BE, PE> Session<I2C, P, IRQ, REG, S, D>
where
    I2C: I2c<SevenBitAddress, Error = BE>,
    BE: embedded_hal_async::i2c::Error,
    P: FlexPin<Error = PE>,
    PE: embedded_hal::digital::Error,
    IRQ: InterruptLine,
    REG: Regulator,
    S: TouchSink,
    D: DelayNs,
{
    /// Runs the sequence from scratch until the device runs or, for a
    /// deferred configuration, until the variant is resolved.
    pub(crate) async fn bring_up<PP: PinProvider<Pin = P>>(
        &mut self,
        pins: &mut PP,
    ) -> Result<BringUpState, Error<BE, PE>> {
        match self.stage {
            BringUpState::Running => return Ok(BringUpState::Running),
            BringUpState::Unconfigured | BringUpState::Failed => {}
            _ => return Err(Error::InvalidState),
        }
        // Lines kept by a failed deferred load.
        self.release_lines(pins);
        self.stage = BringUpState::Unconfigured;

        match self.run_sequence(pins).await {
            Ok(state) => Ok(state),
            Err(err) => {
                log::error!("Bring-up failed after {:?}: {err:?}", self.stage);
                self.abort();
                self.release_lines(pins);
                Err(err)
            }
        }
    }

    async fn run_sequence<PP: PinProvider<Pin = P>>(
        &mut self,
        pins: &mut PP,
    ) -> Result<BringUpState, Error<BE, PE>> {
        loop {
            let next = match self.stage {
                BringUpState::Unconfigured => {
                    self.configure_gpio(pins)?;
                    BringUpState::GpioConfigured
                }
                BringUpState::GpioConfigured if self.has_reset_lines() => {
                    self.reset().await?;
                    BringUpState::Reset
                }
                BringUpState::GpioConfigured | BringUpState::Reset => {
                    self.probe().await?;
                    BringUpState::BusVerified
                }
                BringUpState::BusVerified => {
                    self.read_version().await?;
                    BringUpState::VersionRead
                }
                BringUpState::VersionRead => {
                    self.resolve_variant().await?;
                    BringUpState::VariantResolved
                }
                BringUpState::VariantResolved if !self.has_reset_lines() => {
                    self.start().await?;
                    BringUpState::Running
                }
                BringUpState::VariantResolved => match self.pending_blob()? {
                    Some(blob) => {
                        self.apply_config(blob).await?;
                        BringUpState::ConfigApplied
                    }
                    None => {
                        log::debug!("Waiting for deferred configuration");
                        return Ok(BringUpState::VariantResolved);
                    }
                },
                BringUpState::ConfigApplied => {
                    self.start().await?;
                    BringUpState::Running
                }
                BringUpState::Running => return Ok(BringUpState::Running),
                BringUpState::Failed => return Err(Error::InvalidState),
            };
            log::debug!("Bring-up {:?} -> {next:?}", self.stage);
            self.stage = next;
        }
    }

    /// Completes a bring-up that stopped at [`BringUpState::VariantResolved`].
    pub(crate) async fn finish_deferred(
        &mut self,
        blob: Option<ConfigBlob>,
    ) -> Result<(), Error<BE, PE>> {
        if self.stage != BringUpState::VariantResolved
            || !matches!(self.config.source, ConfigSource::Deferred)
        {
            return Err(Error::InvalidState);
        }

        let result = match blob {
            Some(blob) => self.configure_and_start(blob).await,
            None => Err(Error::ConfigUnavailable),
        };
        if let Err(err) = &result {
            log::error!("Deferred configuration failed: {err:?}");
            self.abort();
        }
        result
    }

    async fn configure_and_start(&mut self, blob: ConfigBlob) -> Result<(), Error<BE, PE>> {
        self.apply_config(blob).await?;
        self.stage = BringUpState::ConfigApplied;
        self.start().await?;
        self.stage = BringUpState::Running;
        Ok(())
    }

    /// Drops everything a failed attempt set up. Lines are released by the
    /// caller that owns the provider.
    fn abort(&mut self) {
        self.free_irq();
        if let Some(regulators) = self.regulators.as_mut() {
            regulators.switch(false);
        }
        self.applied = None;
        self.stage = BringUpState::Failed;
    }

    fn configure_gpio<PP: PinProvider<Pin = P>>(
        &mut self,
        pins: &mut PP,
    ) -> Result<(), Error<BE, PE>> {
        if let Some(regulators) = self.regulators.as_mut() {
            regulators.switch(true);
        }

        self.int = acquire_line::<_, BE, PE>(pins, LineRole::Interrupt)?;
        self.rst = acquire_line::<_, BE, PE>(pins, LineRole::Reset)?;
        if !self.has_reset_lines() {
            log::info!("Reset lines not wired, running without reset and configuration upload");
        }
        Ok(())
    }

    /// Power-on reset with bus address selection.
    async fn reset(&mut self) -> Result<(), Error<BE, PE>> {
        log::trace!("goodix::reset start");
        self.set_line(LineRole::Reset, Some(PinState::Low))?;
        self.sleep(timing::RESET_LOW).await;

        let select = PinState::from(self.config.address.select_high());
        self.set_line(LineRole::Interrupt, Some(select))?;
        self.sleep(timing::ADDRESS_SELECT).await;

        self.set_line(LineRole::Reset, Some(PinState::High))?;
        self.sleep(timing::RESET_HIGH).await;

        self.set_line(LineRole::Reset, None)?;
        self.int_sync().await?;
        log::trace!("goodix::reset done");
        Ok(())
    }

    /// Checks that the device answers on the bus.
    async fn probe(&mut self) -> Result<(), Error<BE, PE>> {
        let mut test = [0u8; 1];
        let mut attempt = 1;
        loop {
            match self.bus.read(REG_ID, &mut test).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < PROBE_ATTEMPTS => {
                    log::warn!("Bus test failed attempt {attempt}: {err:?}");
                    self.sleep(timing::PROBE_BACKOFF).await;
                    attempt += 1;
                }
                Err(err) => {
                    log::error!("Bus communication failure: {err:?}");
                    return Err(err.into());
                }
            }
        }
    }

    async fn read_version(&mut self) -> Result<(), Error<BE, PE>> {
        let mut buf = [0u8; ID_BLOCK_LEN];
        self.bus.read(REG_ID, &mut buf).await.map_err(|err| {
            log::error!("Read version failed: {err:?}");
            err
        })?;

        self.chip_id = parse_chip_id(&[buf[0], buf[1], buf[2], buf[3]]);
        self.version = u16::from_le_bytes([buf[4], buf[5]]);
        log::info!("ID {}, version: {:04x}", self.chip_id, self.version);
        Ok(())
    }

    async fn resolve_variant(&mut self) -> Result<(), Error<BE, PE>> {
        self.variant = VariantDescriptor::lookup(self.chip_id);
        log::debug!("Chip {} uses variant {}", self.chip_id, self.variant.name);

        let mut sensor = [0u8; 1];
        self.sensor_id = match self.bus.read(REG_SENSOR_ID, &mut sensor).await {
            Ok(()) if sensor[0] > MAX_SENSOR_ID => {
                log::error!("Invalid sensor id {:#x}", sensor[0]);
                return Err(Error::InvalidSensorId(sensor[0]));
            }
            Ok(()) => sensor[0],
            Err(err) => {
                log::warn!("Read sensor id failed: {err:?}");
                0
            }
        };
        Ok(())
    }

    /// The blob to upload now, or `None` when it arrives later.
    fn pending_blob(&self) -> Result<Option<ConfigBlob>, Error<BE, PE>> {
        match &self.config.source {
            ConfigSource::None => Err(Error::ConfigUnavailable),
            ConfigSource::Blob(blob) => Ok(Some(blob.clone())),
            ConfigSource::PerSensor(lookup) => match lookup(self.sensor_id) {
                Some(blob) => Ok(Some(blob)),
                None => {
                    log::error!("No config for sensor id {}", self.sensor_id);
                    Err(Error::ConfigUnavailable)
                }
            },
            ConfigSource::Deferred => Ok(None),
        }
    }

    /// Validates `blob` for the resolved variant and writes it.
    async fn apply_config(&mut self, blob: ConfigBlob) -> Result<(), Error<BE, PE>> {
        if blob.kind() != self.variant.checksum {
            log::warn!(
                "Config tagged {:?}, {} expects {:?}",
                blob.kind(),
                self.variant.name,
                self.variant.checksum
            );
        }
        blob::validate(blob.as_bytes(), self.variant.checksum).map_err(|err| {
            log::error!("Rejecting config: {err}");
            err
        })?;

        self.bus
            .write(self.variant.config_addr, blob.as_bytes())
            .await
            .map_err(|err| {
                log::error!("Failed to write config data: {err:?}");
                err
            })?;
        log::debug!("Config sent successfully");

        // Let the firmware reconfigure itself.
        self.sleep(timing::CONFIG_LATCH).await;
        self.applied = Some(blob);
        Ok(())
    }

    /// Reads the live configuration, registers with the sink and arms the
    /// interrupt.
    async fn start(&mut self) -> Result<(), Error<BE, PE>> {
        let (max_x, max_y) = self.read_device_config().await;
        let overrides = self.config.properties;
        let mut max_x = overrides.max_x.unwrap_or(max_x);
        let mut max_y = overrides.max_y.unwrap_or(max_y);

        if max_x == 0 || max_y == 0 || self.max_contacts == 0 {
            log::warn!("Invalid config, using defaults");
            max_x = DEFAULT_MAX_X;
            max_y = DEFAULT_MAX_Y;
            self.max_contacts = MAX_CONTACTS;
        }
        if self.max_contacts > MAX_CONTACTS {
            log::warn!(
                "Device reports {} contacts, limiting to {MAX_CONTACTS}",
                self.max_contacts
            );
            self.max_contacts = MAX_CONTACTS;
        }

        self.props = TouchscreenProperties {
            max_x,
            max_y,
            invert_x: overrides.invert_x,
            invert_y: overrides.invert_y,
            swap_xy: overrides.swap_xy,
        };

        let descriptor = self.descriptor();
        self.sink.register(&descriptor).map_err(|err| {
            log::error!("Failed to register input device: {err:?}");
            Error::Registration
        })?;

        self.arm_irq()?;
        self.power = PowerState::Active;
        log::info!(
            "Touch device configured: {}x{}, {} contacts, {:?}",
            u32::from(max_x) + 1,
            u32::from(max_y) + 1,
            self.max_contacts,
            self.trigger
        );
        Ok(())
    }

    /// Trigger, contact count and axis maxima from the configuration block.
    /// Unreadable or zero fields yield zero maxima.
    async fn read_device_config(&mut self) -> (u16, u16) {
        let mut config = [0u8; CONFIG_MAX_LENGTH];
        let len = self.variant.config_len;
        if let Err(err) = self.bus.read(self.variant.config_addr, &mut config[..len]).await {
            log::warn!("Error reading config: {err:?}");
            self.trigger = Trigger::default();
            self.max_contacts = MAX_CONTACTS;
            return (0, 0);
        }

        self.trigger = Trigger::from_bits(config[cfg::TRIGGER]);
        self.max_contacts = config[cfg::MAX_CONTACTS] & 0x0F;

        let res = cfg::RESOLUTION;
        let x = u16::from_le_bytes([config[res], config[res + 1]]);
        let y = u16::from_le_bytes([config[res + 2], config[res + 3]]);
        if x != 0 && y != 0 {
            (x - 1, y - 1)
        } else {
            (0, 0)
        }
    }
}

fn acquire_line<PP, BE, PE>(pins: &mut PP, role: LineRole) -> Result<Option<PP::Pin>, Error<BE, PE>>
where
    PP: PinProvider,
    PP::Pin: FlexPin<Error = PE>,
{
    match pins.acquire(role) {
        Ok(line) => Ok(line),
        Err(AcquireError::NotReady) => {
            log::debug!("{role:?} line not ready, deferring");
            Err(Error::ProbeDeferred)
        }
        Err(AcquireError::Failed(err)) => {
            log::error!("Failed to get {role:?} line");
            Err(Error::Pin(err))
        }
    }
}
