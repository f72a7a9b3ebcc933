//! Bounded effect parameters

/// A named effect parameter whose value always lies within `[min, max]`
///
/// Setters clamp instead of rejecting. A NaN write is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectParameter {
    name: String,
    value: f32,
    min_value: f32,
    max_value: f32,
    unit: String,
    description: String,
}

impl EffectParameter {
    /// Create a parameter; bounds given in the wrong order are swapped
    pub fn new(name: &str, value: f32, min_value: f32, max_value: f32, unit: &str) -> Self {
        let (min_value, max_value) = if min_value <= max_value {
            (min_value, max_value)
        } else {
            (max_value, min_value)
        };
        let mut param = Self {
            name: name.to_string(),
            value: min_value,
            min_value,
            max_value,
            unit: unit.to_string(),
            description: String::new(),
        };
        param.set_value(value);
        param
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Store `value` clamped into bounds and return what was stored
    pub fn set_value(&mut self, value: f32) -> f32 {
        if !value.is_nan() {
            self.value = value.clamp(self.min_value, self.max_value);
        }
        self.value
    }
}
