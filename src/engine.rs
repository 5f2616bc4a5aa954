//! Charge decision engine
//!
//! Pure decision logic: maps price cheapness, battery state of charge, PV
//! output and the currently observed device state to a target work mode and
//! export-limit setting. Commands are planned only where the observed state
//! differs from the target, which is the hysteresis that keeps the loop from
//! flapping every minute.

/// Battery SoC at or above which grid charging is pointless (percent)
pub const SOC_CHARGE_CUTOFF_PERCENT: u8 = 99;

/// PV output at or below which the panels are considered idle (Watts)
pub const PV_IDLE_WATTS: u32 = 100;

/// Inverter work mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkMode {
    /// Charge the battery from the grid
    Backup,
    /// Self-consumption / normal operation
    General,
}

impl WorkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::General => "general",
        }
    }

    /// Parse a mode label as reported by the device; unknown labels map to
    /// `None` so the next cycle re-establishes a known mode.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "backup" => Some(Self::Backup),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

/// Device state as observed at the start of a cycle.
///
/// Read fresh every cycle and never cached; unavailable sensors are mapped
/// to conservative defaults by the reader (SoC 100, PV 0, mode unknown,
/// export switch off).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSnapshot {
    /// PV generation in Watts
    pub pv_power_w: u32,

    /// Battery state of charge in percent (0-100)
    pub battery_soc: u8,

    /// Currently selected work mode, if known
    pub work_mode: Option<WorkMode>,

    /// Whether the export limit switch is currently on
    pub export_limit_active: bool,
}

impl Default for DeviceSnapshot {
    /// The sensor-unavailable fallback: battery treated as full, PV as idle.
    fn default() -> Self {
        Self {
            pv_power_w: 0,
            battery_soc: 100,
            work_mode: None,
            export_limit_active: false,
        }
    }
}

/// Desired device state for the current cycle, recomputed from scratch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetState {
    pub work_mode: WorkMode,
    pub export_limit: bool,
}

/// Commands to issue this cycle; `None` means the observed state already
/// matches the target
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CyclePlan {
    pub set_mode: Option<WorkMode>,
    pub set_export_limit: Option<bool>,
}

impl CyclePlan {
    pub fn is_noop(&self) -> bool {
        self.set_mode.is_none() && self.set_export_limit.is_none()
    }
}

/// Compute the target state for this cycle.
///
/// Backup (grid charging) is selected only while the current hour is cheap,
/// the battery is not yet full and the panels are idle; in backup mode the
/// export limit is forced off. In general mode the limit follows the battery
/// and PV state: active while the battery can still absorb and PV output is
/// at or below the configured threshold, inactive otherwise.
pub fn decide(
    is_cheap_hour: bool,
    snapshot: &DeviceSnapshot,
    pv_threshold_watts: u32,
) -> TargetState {
    let battery_can_charge = snapshot.battery_soc < SOC_CHARGE_CUTOFF_PERCENT;

    let work_mode = if is_cheap_hour && battery_can_charge && snapshot.pv_power_w <= PV_IDLE_WATTS {
        WorkMode::Backup
    } else {
        WorkMode::General
    };

    let export_limit = match work_mode {
        WorkMode::Backup => false,
        WorkMode::General => battery_can_charge && snapshot.pv_power_w <= pv_threshold_watts,
    };

    TargetState {
        work_mode,
        export_limit,
    }
}

/// Plan the commands needed to move the device to the target state.
///
/// A mode command is planned when the observed mode differs from the target
/// or is unknown (the first cycle always establishes a known mode). An
/// export command is planned only when the switch state differs from the
/// target, never to re-assert a state the device already holds.
pub fn plan(target: TargetState, snapshot: &DeviceSnapshot) -> CyclePlan {
    let set_mode = match snapshot.work_mode {
        Some(current) if current == target.work_mode => None,
        _ => Some(target.work_mode),
    };

    let set_export_limit = if snapshot.export_limit_active == target.export_limit {
        None
    } else {
        Some(target.export_limit)
    };

    CyclePlan {
        set_mode,
        set_export_limit,
    }
}
