use crate::models::{DailyObservation, HeatModel};

/// Base temperature for grapevine growth, in Celsius.
pub const BASE_TEMP_C: f64 = 10.0;

/// Calculate classic growing degree days for one day: daily mean temperature
/// above the 10 °C base, floored at zero.
pub fn classic_base10(temp_min_c: f64, temp_max_c: f64) -> f64 {
    ((temp_max_c + temp_min_c) / 2.0 - BASE_TEMP_C).max(0.0)
}

/// Calculate effective growing degree days: the classic value scaled by a
/// heat-stress multiplier. Full credit up to a 30 °C high, a linear ramp
/// down to 0.8 at 35 °C, quadratic decay past that, clamped to [0, 1].
/// The multiplier is continuous at both breakpoints.
pub fn effective(temp_min_c: f64, temp_max_c: f64) -> f64 {
    let core = classic_base10(temp_min_c, temp_max_c);

    let multiplier = if temp_max_c <= 30.0 {
        1.0
    } else if temp_max_c <= 35.0 {
        1.0 - 0.04 * (temp_max_c - 30.0)
    } else {
        0.8 - 0.02 * (temp_max_c - 35.0).powi(2)
    };

    core * multiplier.clamp(0.0, 1.0)
}

/// Heat contribution of one cached observation under the chosen model.
/// A day missing either temperature contributes zero.
pub fn day_heat(observation: &DailyObservation, model: HeatModel) -> f64 {
    match (observation.temp_min_c, observation.temp_max_c) {
        (Some(min), Some(max)) => match model {
            HeatModel::Classic => classic_base10(min, max),
            HeatModel::Effective => effective(min, max),
        },
        _ => 0.0,
    }
}
