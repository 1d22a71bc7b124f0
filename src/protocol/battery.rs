use serde::Deserialize;
use serde_json::{json, Value};

/// Normalized battery reading, as written to the device row.
///
/// `power` is conventionally a percentage in `0..=100`; the bound is not
/// enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battery {
    pub power: i64,
    pub charging: bool,
}

impl From<Battery> for Value {
    fn from(battery: Battery) -> Self {
        json!({ "power": battery.power, "charging": battery.charging })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BatteryReading {
    pub power: Option<i64>,
    pub charging: Option<bool>,
}

/// Body of `POST /battery`. Everything is optional.
#[derive(Debug, Default, Deserialize)]
pub struct BatteryInput {
    #[serde(default)]
    pub battery: Option<BatteryReading>,
}

impl BatteryInput {
    /// Fill in defaults: no reading at all, or a partial one, becomes
    /// `{power: 0, charging: false}` for the missing parts.
    pub fn normalize(self) -> Battery {
        let reading = self.battery.unwrap_or_default();
        Battery {
            power: reading.power.unwrap_or(0),
            charging: reading.charging.unwrap_or(false),
        }
    }
}
