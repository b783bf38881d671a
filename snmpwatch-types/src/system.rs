//! Descriptive information about the polled agent.

use crate::TimeTicks;

/// Static description of the agent, read once at start-up.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemInfo {
    /// Free-form system description (`sysDescr`).
    pub description: String,
    /// Vendor object identifier, rendered as text.
    pub object_id: String,
    /// Agent uptime when the information was read.
    pub uptime: TimeTicks,
    /// Administrator contact.
    pub contact: String,
    /// Administratively assigned name.
    pub name: String,
    /// Physical location.
    pub location: String,
    /// Bit mask of offered service layers.
    pub services: i64,
    /// Interface names in index order.
    pub interfaces: Vec<String>,
}

impl SystemInfo {
    const SOFTWARE_MARKER: &'static str = "Software: ";

    /// Hardware part of the description.
    ///
    /// Descriptions of the form `Hardware: <hw> - Software: <sw>` yield `<hw>`;
    /// any other description is returned whole.
    pub fn hardware(&self) -> &str {
        match self.description.split_once(Self::SOFTWARE_MARKER) {
            Some((hw, _)) => hw
                .trim()
                .trim_start_matches("Hardware:")
                .trim_end_matches('-')
                .trim(),
            None => self.description.trim(),
        }
    }

    /// Software part of the description, when the description names one.
    pub fn software(&self) -> Option<&str> {
        self.description
            .split_once(Self::SOFTWARE_MARKER)
            .map(|(_, sw)| sw.trim())
    }

    /// Location, or `Unknown` when the agent reports none.
    pub fn location_or_default(&self) -> &str {
        if self.location.is_empty() {
            "Unknown"
        } else {
            &self.location
        }
    }

    /// Contact, or `None` when the agent reports none.
    pub fn contact_or_default(&self) -> &str {
        if self.contact.is_empty() {
            "None"
        } else {
            &self.contact
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_hardware_and_software() {
        let info = SystemInfo {
            description: "Hardware: Intel64 Family 6 Model 142 - Software: Windows Version 6.3 (Build 19045 Multiprocessor Free)".to_string(),
            ..Default::default()
        };
        assert_eq!(info.hardware(), "Intel64 Family 6 Model 142");
        assert_eq!(
            info.software(),
            Some("Windows Version 6.3 (Build 19045 Multiprocessor Free)")
        );
    }

    #[test]
    fn plain_description_is_hardware_only() {
        let info = SystemInfo {
            description: "Linux router 6.1.0 #1 SMP x86_64".to_string(),
            ..Default::default()
        };
        assert_eq!(info.hardware(), "Linux router 6.1.0 #1 SMP x86_64");
        assert_eq!(info.software(), None);
    }

    #[test]
    fn empty_fields_fall_back() {
        let info = SystemInfo::default();
        assert_eq!(info.location_or_default(), "Unknown");
        assert_eq!(info.contact_or_default(), "None");
    }
}
