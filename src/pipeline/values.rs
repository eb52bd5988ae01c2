use crate::reader::{GridFile, VariableInfo};

/// Magnitudes at or above this are treated as fill values (MERRA-2 uses 1e15).
const FILL_THRESHOLD: f64 = 1.0e15;

/// Turns raw stored numbers into physical values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueDecoder {
    scale_factor: f64,
    add_offset: f64,
    fill_value: Option<f64>,
    missing_value: Option<f64>,
}

impl Default for ValueDecoder {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            add_offset: 0.0,
            fill_value: None,
            missing_value: None,
        }
    }
}

impl ValueDecoder {
    /// Reads `scale_factor`, `add_offset`, `_FillValue` and `missing_value` from the variable.
    pub fn for_variable(file: &dyn GridFile, variable: &VariableInfo) -> Self {
        Self {
            scale_factor: file.attribute_f64(variable, "scale_factor").unwrap_or(1.0),
            add_offset: file.attribute_f64(variable, "add_offset").unwrap_or(0.0),
            fill_value: file.attribute_f64(variable, "_FillValue"),
            missing_value: file.attribute_f64(variable, "missing_value"),
        }
    }

    /// Fill checks run on the stored value, before scaling.
    pub fn decode(&self, raw: f64) -> Option<f64> {
        if !raw.is_finite() || raw.abs() >= FILL_THRESHOLD {
            return None;
        }
        if self.fill_value == Some(raw) || self.missing_value == Some(raw) {
            return None;
        }
        let value = raw * self.scale_factor + self.add_offset;
        value.is_finite().then_some(value)
    }
}
