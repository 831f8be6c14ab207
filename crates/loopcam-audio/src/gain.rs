//! Decibel helpers shared by the mixer and the track manager.

/// Lowest persistent track gain; treated as silence.
pub const MIN_GAIN_DB: f32 = -40.0;
/// Highest persistent track gain.
pub const MAX_GAIN_DB: f32 = 6.0;

/// Clamp a gain to the supported track range. NaN maps to the floor.
pub fn clamp_db(db: f32) -> f32 {
    if db.is_nan() {
        MIN_GAIN_DB
    } else {
        db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
    }
}

/// Convert decibels to a linear factor; anything at or below
/// [`MIN_GAIN_DB`] is silent.
pub fn db_to_linear(db: f32) -> f32 {
    if db.is_nan() || db <= MIN_GAIN_DB {
        0.0
    } else {
        10f32.powf(db / 20.0)
    }
}

/// Convert a linear factor back to decibels, floored at [`MIN_GAIN_DB`].
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        MIN_GAIN_DB
    } else {
        clamp_db(20.0 * linear.log10())
    }
}
