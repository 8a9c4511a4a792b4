//! The `HeartRecord` input schema.

use serde_json::Value;

use super::validation::{Bounds, Categorical, FieldError, FieldReader, ValidationError, ViolationKind};
use crate::model_runtime::FeatureValue;

/// Column order expected by every fitted pipeline.
pub const FIELD_NAMES: [&str; 11] = [
    "Age",
    "Sex",
    "ChestPainType",
    "RestingBP",
    "Cholesterol",
    "FastingBS",
    "RestingECG",
    "MaxHR",
    "ExerciseAngina",
    "Oldpeak",
    "ST_Slope",
];

const AGE_BOUNDS: Bounds = Bounds::between(0.0, 120.0);
const NON_NEGATIVE: Bounds = Bounds::at_least(0.0);
const OLDPEAK_MIN: f64 = -5.0;
const OLDPEAK_MAX: f64 = 10.0;
const FASTING_BS_VALUES: [i64; 2] = [0, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    M,
    F,
}

impl Categorical for Sex {
    const VARIANTS: &'static [Self] = &[Sex::M, Sex::F];

    fn as_str(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestPainType {
    /// Typical angina
    Ta,
    /// Atypical angina
    Ata,
    /// Non-anginal pain
    Nap,
    /// Asymptomatic
    Asy,
}

impl Categorical for ChestPainType {
    const VARIANTS: &'static [Self] = &[
        ChestPainType::Ta,
        ChestPainType::Ata,
        ChestPainType::Nap,
        ChestPainType::Asy,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ChestPainType::Ta => "TA",
            ChestPainType::Ata => "ATA",
            ChestPainType::Nap => "NAP",
            ChestPainType::Asy => "ASY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestingEcg {
    Normal,
    St,
    Lvh,
}

impl Categorical for RestingEcg {
    const VARIANTS: &'static [Self] = &[RestingEcg::Normal, RestingEcg::St, RestingEcg::Lvh];

    fn as_str(&self) -> &'static str {
        match self {
            RestingEcg::Normal => "Normal",
            RestingEcg::St => "ST",
            RestingEcg::Lvh => "LVH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseAngina {
    Y,
    N,
}

impl Categorical for ExerciseAngina {
    const VARIANTS: &'static [Self] = &[ExerciseAngina::Y, ExerciseAngina::N];

    fn as_str(&self) -> &'static str {
        match self {
            ExerciseAngina::Y => "Y",
            ExerciseAngina::N => "N",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StSlope {
    Up,
    Flat,
    Down,
}

impl Categorical for StSlope {
    const VARIANTS: &'static [Self] = &[StSlope::Up, StSlope::Flat, StSlope::Down];

    fn as_str(&self) -> &'static str {
        match self {
            StSlope::Up => "Up",
            StSlope::Flat => "Flat",
            StSlope::Down => "Down",
        }
    }
}

/// One validated patient record.
///
/// Fields are private: the only way to obtain a record is through
/// [`HeartRecord::from_value`], so every instance satisfies the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartRecord {
    age: f64,
    sex: Sex,
    chest_pain_type: ChestPainType,
    resting_bp: f64,
    cholesterol: f64,
    fasting_bs: i64,
    resting_ecg: RestingEcg,
    max_hr: f64,
    exercise_angina: ExerciseAngina,
    oldpeak: f64,
    st_slope: StSlope,
}

impl HeartRecord {
    /// Validate an untyped JSON value into a record.
    ///
    /// Every field is checked even after a failure, so the returned
    /// [`ValidationError`] lists all violations at once.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let Some(map) = value.as_object() else {
            return Err(ValidationError::new(vec![FieldError::body(
                "body",
                ViolationKind::TypeError,
                "value is not a valid JSON object",
            )]));
        };

        let mut reader = FieldReader::new(map);
        let age = reader.number("Age", AGE_BOUNDS);
        let sex = reader.category::<Sex>("Sex");
        let chest_pain_type = reader.category::<ChestPainType>("ChestPainType");
        let resting_bp = reader.number("RestingBP", NON_NEGATIVE);
        let cholesterol = reader.number("Cholesterol", NON_NEGATIVE);
        let fasting_bs = reader.integer_literal("FastingBS", &FASTING_BS_VALUES);
        let resting_ecg = reader.category::<RestingEcg>("RestingECG");
        let max_hr = reader.number("MaxHR", NON_NEGATIVE);
        let exercise_angina = reader.category::<ExerciseAngina>("ExerciseAngina");
        let oldpeak = read_oldpeak(&mut reader);
        let st_slope = reader.category::<StSlope>("ST_Slope");

        let errors = reader.finish();

        match (
            age,
            sex,
            chest_pain_type,
            resting_bp,
            cholesterol,
            fasting_bs,
            resting_ecg,
            max_hr,
            exercise_angina,
            oldpeak,
            st_slope,
        ) {
            (
                Some(age),
                Some(sex),
                Some(chest_pain_type),
                Some(resting_bp),
                Some(cholesterol),
                Some(fasting_bs),
                Some(resting_ecg),
                Some(max_hr),
                Some(exercise_angina),
                Some(oldpeak),
                Some(st_slope),
            ) if errors.is_empty() => Ok(Self {
                age,
                sex,
                chest_pain_type,
                resting_bp,
                cholesterol,
                fasting_bs,
                resting_ecg,
                max_hr,
                exercise_angina,
                oldpeak,
                st_slope,
            }),
            _ => Err(ValidationError::new(errors)),
        }
    }

    /// Parse and validate raw request bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| {
            ValidationError::new(vec![FieldError::body(
                "body",
                ViolationKind::JsonInvalid,
                format!("invalid JSON: {}", e),
            )])
        })?;
        Self::from_value(&value)
    }

    /// The record as one named row, in [`FIELD_NAMES`] order.
    pub fn feature_row(&self) -> Vec<(&'static str, FeatureValue)> {
        vec![
            ("Age", FeatureValue::Number(self.age)),
            ("Sex", FeatureValue::category(self.sex.as_str())),
            ("ChestPainType", FeatureValue::category(self.chest_pain_type.as_str())),
            ("RestingBP", FeatureValue::Number(self.resting_bp)),
            ("Cholesterol", FeatureValue::Number(self.cholesterol)),
            ("FastingBS", FeatureValue::Number(self.fasting_bs as f64)),
            ("RestingECG", FeatureValue::category(self.resting_ecg.as_str())),
            ("MaxHR", FeatureValue::Number(self.max_hr)),
            ("ExerciseAngina", FeatureValue::category(self.exercise_angina.as_str())),
            ("Oldpeak", FeatureValue::Number(self.oldpeak)),
            ("ST_Slope", FeatureValue::category(self.st_slope.as_str())),
        ]
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn chest_pain_type(&self) -> ChestPainType {
        self.chest_pain_type
    }

    pub fn resting_bp(&self) -> f64 {
        self.resting_bp
    }

    pub fn cholesterol(&self) -> f64 {
        self.cholesterol
    }

    pub fn fasting_bs(&self) -> i64 {
        self.fasting_bs
    }

    pub fn resting_ecg(&self) -> RestingEcg {
        self.resting_ecg
    }

    pub fn max_hr(&self) -> f64 {
        self.max_hr
    }

    pub fn exercise_angina(&self) -> ExerciseAngina {
        self.exercise_angina
    }

    pub fn oldpeak(&self) -> f64 {
        self.oldpeak
    }

    pub fn st_slope(&self) -> StSlope {
        self.st_slope
    }
}

/// Oldpeak has its own message; the bounds are an expected clinical range.
fn read_oldpeak(reader: &mut FieldReader<'_>) -> Option<f64> {
    let value = reader.number("Oldpeak", Bounds::unbounded())?;
    if value < OLDPEAK_MIN || value > OLDPEAK_MAX {
        reader.push(FieldError::body(
            "Oldpeak",
            ViolationKind::RangeError,
            "Oldpeak looks out of expected range (-5, 10)",
        ));
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "Age": 54,
            "Sex": "M",
            "ChestPainType": "ASY",
            "RestingBP": 140,
            "Cholesterol": 239,
            "FastingBS": 0,
            "RestingECG": "Normal",
            "MaxHR": 160,
            "ExerciseAngina": "N",
            "Oldpeak": 1.2,
            "ST_Slope": "Flat"
        })
    }

    fn with(field: &str, value: Value) -> Value {
        let mut body = valid();
        body[field] = value;
        body
    }

    #[test]
    fn test_valid_record() {
        let record = HeartRecord::from_value(&valid()).unwrap();
        assert_eq!(record.age(), 54.0);
        assert_eq!(record.sex(), Sex::M);
        assert_eq!(record.chest_pain_type(), ChestPainType::Asy);
        assert_eq!(record.fasting_bs(), 0);
        assert_eq!(record.st_slope(), StSlope::Flat);
        assert_eq!(record.oldpeak(), 1.2);
    }

    #[test]
    fn test_age_bounds() {
        assert!(HeartRecord::from_value(&with("Age", json!(0))).is_ok());
        assert!(HeartRecord::from_value(&with("Age", json!(120))).is_ok());
        assert!(HeartRecord::from_value(&with("Age", json!(-1))).unwrap_err().mentions("Age"));
        assert!(HeartRecord::from_value(&with("Age", json!(121))).unwrap_err().mentions("Age"));
    }

    #[test]
    fn test_oldpeak_bounds() {
        assert!(HeartRecord::from_value(&with("Oldpeak", json!(-5))).is_ok());
        assert!(HeartRecord::from_value(&with("Oldpeak", json!(10))).is_ok());
        assert!(HeartRecord::from_value(&with("Oldpeak", json!(-5.01))).unwrap_err().mentions("Oldpeak"));
        assert!(HeartRecord::from_value(&with("Oldpeak", json!(10.01))).unwrap_err().mentions("Oldpeak"));
    }

    #[test]
    fn test_categoricals_are_case_sensitive() {
        let err = HeartRecord::from_value(&with("Sex", json!("m"))).unwrap_err();
        assert!(err.mentions("Sex"));
        let err = HeartRecord::from_value(&with("RestingECG", json!("normal"))).unwrap_err();
        assert!(err.mentions("RestingECG"));
    }

    #[test]
    fn test_all_violations_reported() {
        let mut body = valid();
        body["Sex"] = json!("X");
        body["Age"] = json!(200);
        body.as_object_mut().unwrap().remove("MaxHR");
        body["FastingBS"] = json!(2);

        let err = HeartRecord::from_value(&body).unwrap_err();
        assert_eq!(err.errors().len(), 4);
        for field in ["Sex", "Age", "MaxHR", "FastingBS"] {
            assert!(err.mentions(field), "missing violation for {}", field);
        }
    }

    #[test]
    fn test_missing_field_kind() {
        let mut body = valid();
        body.as_object_mut().unwrap().remove("ST_Slope");
        let err = HeartRecord::from_value(&body).unwrap_err();
        assert_eq!(err.errors()[0].kind, ViolationKind::Missing);
    }

    #[test]
    fn test_non_object_body() {
        let err = HeartRecord::from_value(&json!([1, 2])).unwrap_err();
        assert!(err.mentions("body"));
        let err = HeartRecord::from_slice(b"{not json").unwrap_err();
        assert_eq!(err.errors()[0].kind, ViolationKind::JsonInvalid);
    }

    #[test]
    fn test_extra_keys_ignored() {
        let body = with("Unrelated", json!("whatever"));
        assert!(HeartRecord::from_value(&body).is_ok());
    }

    #[test]
    fn test_feature_row_follows_field_order() {
        let record = HeartRecord::from_value(&valid()).unwrap();
        let names: Vec<_> = record.feature_row().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, FIELD_NAMES.to_vec());
    }
}
