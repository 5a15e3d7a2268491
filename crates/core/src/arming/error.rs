//! Arming refusal and disarm reasons

use core::fmt;

use super::ArmingDisableFlags;

/// Why an arming request was not granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmingError {
    /// The arm switch is on but at least one check blocks arming
    Refused {
        /// Every check that failed on the refusing cycle
        flags: ArmingDisableFlags,
    },
    /// Vehicle is already armed
    AlreadyArmed,
}

impl ArmingError {
    /// Short name of the most relevant failing check
    pub fn as_str(&self) -> &'static str {
        match self {
            ArmingError::Refused { flags } => flags.dominant_reason(),
            ArmingError::AlreadyArmed => "already armed",
        }
    }
}

impl fmt::Display for ArmingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArmingError::Refused { flags } => {
                write!(
                    f,
                    "Arming refused ({}), flags 0x{:02x}",
                    flags.dominant_reason(),
                    flags.bits()
                )
            }
            ArmingError::AlreadyArmed => write!(f, "Vehicle is already armed"),
        }
    }
}

/// Why the vehicle last disarmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisarmReason {
    /// Pilot moved the arm switch off
    Switch,
    /// No valid RC message within the link-loss window
    LinkLoss,
    /// Return-to-home confirmed the landing
    Landed,
    /// Configurator motor override took over
    Override,
}

impl DisarmReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisarmReason::Switch => "switch",
            DisarmReason::LinkLoss => "link loss",
            DisarmReason::Landed => "landed",
            DisarmReason::Override => "override",
        }
    }
}

impl fmt::Display for DisarmReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;

    #[test]
    fn test_arming_error_display() {
        let error = ArmingError::Refused {
            flags: ArmingDisableFlags::THROTTLE | ArmingDisableFlags::LINK_DOWN,
        };
        assert_eq!(
            format!("{}", error),
            "Arming refused (rc link down), flags 0x12"
        );
        assert_eq!(error.as_str(), "rc link down");

        let error = ArmingError::AlreadyArmed;
        assert_eq!(format!("{}", error), "Vehicle is already armed");
    }

    #[test]
    fn test_disarm_reason_display() {
        assert_eq!(format!("{}", DisarmReason::LinkLoss), "link loss");
        assert_eq!(DisarmReason::Landed.as_str(), "landed");
    }
}
