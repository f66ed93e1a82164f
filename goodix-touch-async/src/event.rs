//! Touch report processing.

use embassy_time::Instant;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::bringup::BringUpState;
use crate::error::Error;
use crate::hal::{FlexPin, InterruptLine, Regulator, TouchSink};
use crate::reg::{timing, CONTACT_SIZE, MAX_CONTACTS, REG_READ_COOR};
use crate::report::{decode_frame, Status, TouchFrame};
use crate::session::{IrqState, Session};

/// Status byte plus the first contact record.
const HEAD_LEN: usize = 1 + CONTACT_SIZE;
const REPORT_LEN: usize = 1 + CONTACT_SIZE * MAX_CONTACTS as usize;

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
    /// Services one touch interrupt: reads the report, forwards it to the
    /// sink and acknowledges it.
    pub(crate) async fn process_report(&mut self) -> Result<TouchFrame, Error<BE, PE>> {
        if self.stage != BringUpState::Running || self.irq_state != IrqState::Enabled {
            return Err(Error::InvalidState);
        }

        let result = self.read_report().await;
        match &result {
            Ok(frame) => {
                self.sink.emit_button(frame.button);
                self.sink.emit_frame(frame);
            }
            Err(err) => log::warn!("Dropping touch report: {err:?}"),
        }

        // The device keeps the report latched until the status is cleared.
        if let Err(err) = self.bus.write_u8(REG_READ_COOR, 0).await {
            log::warn!("I2C write end_cmd error: {err:?}");
        }
        result
    }

    /// Polls the report register until the device marks it ready or the
    /// deadline passes. A missed deadline yields an empty frame.
    async fn read_report(&mut self) -> Result<TouchFrame, Error<BE, PE>> {
        let mut data = [0u8; REPORT_LEN];
        let deadline = Instant::now() + timing::REPORT_DEADLINE;

        loop {
            self.bus.read(REG_READ_COOR, &mut data[..HEAD_LEN]).await?;

            let status = Status(data[0]);
            if status.is_ready() {
                let contacts = status.contacts();
                if contacts > self.max_contacts {
                    return Err(Error::Protocol {
                        contacts,
                        max: self.max_contacts,
                    });
                }
                let count = usize::from(contacts);
                if count > 1 {
                    let rest = &mut data[HEAD_LEN..1 + CONTACT_SIZE * count];
                    self.bus
                        .read(REG_READ_COOR + HEAD_LEN as u16, rest)
                        .await?;
                }
                return Ok(decode_frame(status, &data, count, &self.props));
            }

            if Instant::now() >= deadline {
                log::trace!(
                    "Report not ready within {}ms",
                    timing::REPORT_DEADLINE.as_millis()
                );
                return Ok(TouchFrame::empty());
            }
            self.sleep(timing::REPORT_POLL).await;
        }
    }
}
