// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed read, write and action operations.

use chrono::NaiveDateTime;

use crate::codec::{self, FromPayload};
use crate::command::Command;
use crate::command::table::{self, CommandSpec};
use crate::error::{ProtocolError, Result};
use crate::protocol::{LeakGuardClient, Transport};
use crate::types::{
    AbsenceLimits, AbsenceWindow, DeviceClock, DeviceType, FirmwareVersion, InstallationDate,
    LeakPreset, LearnStatus, MAX_MICRO_LEAK_MODE, MAX_VACATION_TYPE, SLEEP_HOURS, SerialNumber,
    TotalWater, UsageStatistics, clamp_slot,
};

fn year_bytes(year: i64) -> [u8; 2] {
    codec::clamp_u16(year).to_be_bytes()
}

impl<T: Transport> LeakGuardClient<T> {
    /// Sends `command` and returns its validated payload.
    async fn read_payload(&self, spec: &CommandSpec, command: &Command) -> Result<Option<Vec<u8>>> {
        let response = self.send(command).await?;
        let bytes = response
            .data()
            .map(|hex| codec::to_bytes(&hex))
            .transpose()
            .map_err(|source| ProtocolError::InvalidPayload {
                command: spec.name,
                source,
            })?;
        Ok(spec.validate(bytes)?)
    }

    async fn read_required<M: FromPayload>(&self, spec: &CommandSpec) -> Result<M> {
        let payload = self
            .read_payload(spec, &spec.bare())
            .await?
            .ok_or(ProtocolError::MissingData { command: spec.name })?;
        Ok(M::from_payload(&payload)?)
    }

    async fn read_optional<M: FromPayload>(
        &self,
        spec: &CommandSpec,
        command: &Command,
    ) -> Result<Option<M>> {
        match self.read_payload(spec, command).await? {
            Some(payload) => Ok(Some(M::from_payload(&payload)?)),
            None => {
                tracing::debug!(command = spec.name, "No data reported");
                Ok(None)
            }
        }
    }

    async fn read_statistics(
        &self,
        spec: &CommandSpec,
        payload: Vec<u8>,
    ) -> Result<UsageStatistics> {
        let command = spec.with_payload(payload)?;
        Ok(self
            .read_optional(spec, &command)
            .await?
            .unwrap_or_default())
    }

    async fn write(&self, spec: &CommandSpec, payload: Vec<u8>) -> Result<()> {
        let command = spec.with_payload(payload)?;
        tracing::debug!(command = spec.name, hex = %command.to_hex(), "Writing setting");
        self.send(&command).await?;
        Ok(())
    }

    async fn action(&self, spec: &CommandSpec) -> Result<()> {
        tracing::debug!(command = spec.name, "Triggering action");
        self.send(&spec.bare()).await?;
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Reads the device type code.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if the device is unreachable or rejects the
    /// credentials, and [`ProtocolError`] if the payload is missing or
    /// malformed.
    pub async fn read_device_type(&self) -> Result<DeviceType> {
        self.read_required(&table::DEVICE_TYPE).await
    }

    /// Reads the serial number.
    ///
    /// # Errors
    ///
    /// See [`read_device_type`](Self::read_device_type).
    pub async fn read_serial_number(&self) -> Result<SerialNumber> {
        self.read_required(&table::SERIAL_NUMBER).await
    }

    /// Reads the firmware version.
    ///
    /// # Errors
    ///
    /// See [`read_device_type`](Self::read_device_type).
    pub async fn read_firmware_version(&self) -> Result<FirmwareVersion> {
        self.read_required(&table::FIRMWARE_VERSION).await
    }

    /// Reads the installation date.
    ///
    /// # Errors
    ///
    /// See [`read_device_type`](Self::read_device_type).
    pub async fn read_installation_date(&self) -> Result<InstallationDate> {
        self.read_required(&table::INSTALLATION_DATE).await
    }

    /// Reads the total water counter.
    ///
    /// # Errors
    ///
    /// See [`read_device_type`](Self::read_device_type).
    pub async fn read_total_water(&self) -> Result<TotalWater> {
        self.read_required(&table::TOTAL_WATER).await
    }

    /// Reads the device clock.
    ///
    /// # Errors
    ///
    /// See [`read_device_type`](Self::read_device_type).
    pub async fn read_device_clock(&self) -> Result<DeviceClock> {
        self.read_required(&table::DEVICE_CLOCK).await
    }

    /// Reads the sleep duration in hours, if the firmware reports it.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if the device is unreachable or rejects the
    /// credentials, and [`ProtocolError`] for an oversized payload.
    pub async fn read_sleep_duration(&self) -> Result<Option<u8>> {
        let spec = &table::SLEEP_DURATION;
        self.read_optional(spec, &spec.bare()).await
    }

    /// Reads the absence limits, if the firmware reports them.
    ///
    /// # Errors
    ///
    /// See [`read_sleep_duration`](Self::read_sleep_duration).
    pub async fn read_absence_limits(&self) -> Result<Option<AbsenceLimits>> {
        let spec = &table::ABSENCE_LIMITS;
        self.read_optional(spec, &spec.bare()).await
    }

    /// Reads the micro-leak mode, if the firmware reports it.
    ///
    /// # Errors
    ///
    /// See [`read_sleep_duration`](Self::read_sleep_duration).
    pub async fn read_micro_leak_mode(&self) -> Result<Option<u8>> {
        let spec = &table::MICRO_LEAK_MODE;
        self.read_optional(spec, &spec.bare()).await
    }

    /// Reads the vacation type, if the firmware reports it.
    ///
    /// # Errors
    ///
    /// See [`read_sleep_duration`](Self::read_sleep_duration).
    pub async fn read_vacation_type(&self) -> Result<Option<u8>> {
        let spec = &table::VACATION_TYPE;
        self.read_optional(spec, &spec.bare()).await
    }

    /// Reads the learn mode status, if the firmware reports it.
    ///
    /// # Errors
    ///
    /// See [`read_sleep_duration`](Self::read_sleep_duration).
    pub async fn read_learn_status(&self) -> Result<Option<LearnStatus>> {
        let spec = &table::LEARN_STATUS;
        self.read_optional(spec, &spec.bare()).await
    }

    /// Reads one absence window slot. `slot` is clamped to 0-6.
    ///
    /// # Errors
    ///
    /// See [`read_sleep_duration`](Self::read_sleep_duration).
    pub async fn read_absence_window(&self, slot: i64) -> Result<Option<AbsenceWindow>> {
        let spec = &table::ABSENCE_WINDOW;
        let slot = clamp_slot(slot);
        let command = spec.with_payload(vec![slot])?;
        match self.read_payload(spec, &command).await? {
            Some(payload) => Ok(Some(AbsenceWindow::from_payload(slot, &payload)?)),
            None => Ok(None),
        }
    }

    /// Reads the usage records of one day.
    ///
    /// Day and month are clamped to their calendar ranges. A firmware
    /// without statistics yields an empty series.
    ///
    /// # Errors
    ///
    /// See [`read_sleep_duration`](Self::read_sleep_duration).
    pub async fn read_day_statistics(
        &self,
        day: i64,
        month: i64,
        year: i64,
    ) -> Result<UsageStatistics> {
        let mut payload = vec![codec::clamp_u8(day, 1, 31), codec::clamp_u8(month, 1, 12)];
        payload.extend_from_slice(&year_bytes(year));
        self.read_statistics(&table::DAY_STATISTICS, payload).await
    }

    /// Reads the usage records of one ISO week (1-53).
    ///
    /// # Errors
    ///
    /// See [`read_sleep_duration`](Self::read_sleep_duration).
    pub async fn read_week_statistics(&self, week: i64, year: i64) -> Result<UsageStatistics> {
        let mut payload = vec![codec::clamp_u8(week, 1, 53)];
        payload.extend_from_slice(&year_bytes(year));
        self.read_statistics(&table::WEEK_STATISTICS, payload).await
    }

    /// Reads the usage records of one month.
    ///
    /// # Errors
    ///
    /// See [`read_sleep_duration`](Self::read_sleep_duration).
    pub async fn read_month_statistics(&self, month: i64, year: i64) -> Result<UsageStatistics> {
        let mut payload = vec![codec::clamp_u8(month, 1, 12)];
        payload.extend_from_slice(&year_bytes(year));
        self.read_statistics(&table::MONTH_STATISTICS, payload).await
    }

    /// Reads the usage records of one year.
    ///
    /// # Errors
    ///
    /// See [`read_sleep_duration`](Self::read_sleep_duration).
    pub async fn read_year_statistics(&self, year: i64) -> Result<UsageStatistics> {
        self.read_statistics(&table::YEAR_STATISTICS, year_bytes(year).to_vec())
            .await
    }

    // ========================================================================
    // Writes (all values are clamped)
    // ========================================================================

    /// Sets the sleep duration, clamped to 1-10 hours.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if the device is unreachable or rejects the
    /// credentials.
    pub async fn set_sleep_hours(&self, hours: i64) -> Result<()> {
        let (min, max) = SLEEP_HOURS;
        let hours = codec::clamp_u8(hours, min, max);
        self.write(&table::WRITE_SLEEP_DURATION, vec![hours]).await
    }

    /// Writes the absence limits.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn write_absence_limits(&self, limits: AbsenceLimits) -> Result<()> {
        self.write(&table::WRITE_ABSENCE_LIMITS, limits.to_payload().to_vec())
            .await
    }

    /// Writes a vacation type together with absence limits.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn write_leak_preset(&self, preset: LeakPreset) -> Result<()> {
        self.write(&table::WRITE_LEAK_PRESET, preset.to_payload())
            .await
    }

    /// Sets the vacation type, clamped to 0-3.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn set_vacation_type(&self, vacation_type: i64) -> Result<()> {
        let value = codec::clamp_u8(vacation_type, 0, MAX_VACATION_TYPE);
        self.write(&table::WRITE_VACATION_TYPE, vec![value]).await
    }

    /// Sets the micro-leak mode, clamped to 0-2.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn set_micro_leak_mode(&self, mode: i64) -> Result<()> {
        let value = codec::clamp_u8(mode, 0, MAX_MICRO_LEAK_MODE);
        self.write(&table::WRITE_MICRO_LEAK_MODE, vec![value]).await
    }

    /// Writes one absence window slot.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn write_absence_window(&self, window: AbsenceWindow) -> Result<()> {
        self.write(&table::WRITE_ABSENCE_WINDOW, window.to_payload().to_vec())
            .await
    }

    /// Clears one absence window slot. `slot` is clamped to 0-6.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn delete_absence_window(&self, slot: i64) -> Result<()> {
        self.write(&table::DELETE_ABSENCE_WINDOW, vec![clamp_slot(slot)])
            .await
    }

    /// Sets the device clock.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::YearOutOfRange`](crate::error::ValueError::YearOutOfRange)
    /// for years outside 2000-2255, before anything is sent. Otherwise see
    /// [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn set_clock(&self, datetime: &NaiveDateTime) -> Result<()> {
        let clock = DeviceClock::from_datetime(datetime)?;
        self.write(&table::WRITE_DEVICE_CLOCK, clock.to_payload().to_vec())
            .await
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Acknowledges the active alarm.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn acknowledge_alarm(&self) -> Result<()> {
        self.action(&table::ACKNOWLEDGE_ALARM).await
    }

    /// Opens the valve.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn open_valve(&self) -> Result<()> {
        self.action(&table::OPEN_VALVE).await
    }

    /// Closes the valve.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn close_valve(&self) -> Result<()> {
        self.action(&table::CLOSE_VALVE).await
    }

    /// Starts sleep mode.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn start_sleep(&self) -> Result<()> {
        self.action(&table::SLEEP_START).await
    }

    /// Ends sleep mode.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn end_sleep(&self) -> Result<()> {
        self.action(&table::SLEEP_END).await
    }

    /// Starts vacation mode.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn start_vacation(&self) -> Result<()> {
        self.action(&table::VACATION_START).await
    }

    /// Ends vacation mode.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn end_vacation(&self) -> Result<()> {
        self.action(&table::VACATION_END).await
    }

    /// Triggers the micro-leak test.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn start_micro_leak_test(&self) -> Result<()> {
        self.action(&table::MICRO_LEAK_TEST).await
    }

    /// Starts learn mode.
    ///
    /// # Errors
    ///
    /// See [`set_sleep_hours`](Self::set_sleep_hours).
    pub async fn start_learn_mode(&self) -> Result<()> {
        self.action(&table::LEARN_START).await
    }
}
