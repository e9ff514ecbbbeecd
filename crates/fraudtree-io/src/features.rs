//! Derived model features for one card transaction.

use fraudtree_rf::{FeatureKind, FeatureValue};

/// Mean Earth radius used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Width of the time-of-day bucket applied to `unix_time`, in seconds.
pub const TIME_BUCKET_SECONDS: i64 = 8640;

/// Feature slot names, in model order.
pub const FEATURE_NAMES: [&str; 6] = ["distance", "gender", "age", "time", "category", "amount"];

/// Feature slot types, in model order.
pub const FEATURE_KINDS: [FeatureKind; 6] = [
    FeatureKind::Numeric,
    FeatureKind::Categorical,
    FeatureKind::Numeric,
    FeatureKind::Numeric,
    FeatureKind::Categorical,
    FeatureKind::Numeric,
];

/// Great-circle distance in kilometres between two latitude/longitude points
/// given in degrees.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Seconds into the current [`TIME_BUCKET_SECONDS`] window. Always non-negative.
#[must_use]
pub fn time_bucket(unix_time: i64) -> i64 {
    unix_time.rem_euclid(TIME_BUCKET_SECONDS)
}

/// Parse the four-digit year prefix of a date of birth such as `1988-03-09`.
#[must_use]
pub fn birth_year(dob: &str) -> Option<i32> {
    dob.get(..4)?.parse().ok()
}

/// One parsed transaction record, before feature derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Cardholder latitude.
    pub lat: f64,
    /// Cardholder longitude.
    pub long: f64,
    /// Merchant latitude.
    pub merch_lat: f64,
    /// Merchant longitude.
    pub merch_long: f64,
    /// Cardholder gender token.
    pub gender: String,
    /// Cardholder birth year.
    pub birth_year: i32,
    /// Transaction timestamp in seconds since the Unix epoch.
    pub unix_time: i64,
    /// Merchant category token.
    pub category: String,
    /// Transaction amount.
    pub amount: f64,
}

impl Transaction {
    /// Derive the six model features, in [`FEATURE_NAMES`] order.
    ///
    /// Age is measured against `reference_year`.
    #[must_use]
    pub fn features(&self, reference_year: i32) -> Vec<FeatureValue> {
        vec![
            FeatureValue::Numeric(haversine_km(self.lat, self.long, self.merch_lat, self.merch_long)),
            FeatureValue::Categorical(self.gender.clone()),
            FeatureValue::Numeric(f64::from(reference_year - self.birth_year)),
            FeatureValue::Numeric(time_bucket(self.unix_time) as f64),
            FeatureValue::Categorical(self.category.clone()),
            FeatureValue::Numeric(self.amount),
        ]
    }
}
