//! Participant registration model and its answer enumerations.

use hackpsu_core::types::{flexible, EpochMillis, Uid};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "female")]
    Female,
    #[serde(rename = "non-binary")]
    NonBinary,
    #[serde(rename = "no-disclose")]
    NoDisclose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShirtSize {
    XS,
    S,
    M,
    L,
    XL,
    XXL,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcademicYear {
    Freshman,
    Sophomore,
    Junior,
    Senior,
    Graduate,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodingExperience {
    None,
    Beginner,
    Intermediate,
    Advanced,
    God,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeteranOptions {
    #[serde(rename = "true")]
    Yes,
    #[serde(rename = "false")]
    No,
    #[serde(rename = "no-disclose")]
    NoDisclose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EducationalInstitutionType {
    LessThanSecondary,
    Secondary,
    TwoYearUniversity,
    ThreePlusYearUniversity,
    GraduateUniversity,
    #[serde(rename = "code-school-or-bootcamp")]
    CodeSchoolBootcamp,
    VocationalTradeApprenticeship,
    Other,
    NotAStudent,
    PreferNoAnswer,
}

/// A row from the `REGISTRATION` table.
///
/// Reads that join `HACKATHON` return extra columns (`name`,
/// `start_time`, ...); they are not fields here and are dropped on
/// hydration. `pin` is the raw stored pin unless the read computed it
/// relative to the hackathon's `base_pin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Registration {
    #[serde(default)]
    pub uid: Option<Uid>,
    #[validate(length(min = 1))]
    pub firstname: String,
    #[validate(length(min = 1))]
    pub lastname: String,
    pub gender: Gender,
    pub shirt_size: ShirtSize,
    #[serde(default)]
    pub dietary_restriction: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default, deserialize_with = "flexible::boolean")]
    pub travel_reimbursement: bool,
    #[serde(default, deserialize_with = "flexible::boolean")]
    pub driving: bool,
    #[serde(default, deserialize_with = "flexible::boolean")]
    pub first_hackathon: bool,
    #[validate(length(min = 1))]
    pub university: String,
    #[validate(email)]
    pub email: String,
    pub academic_year: AcademicYear,
    #[serde(default)]
    pub educational_institution_type: Option<EducationalInstitutionType>,
    #[validate(length(min = 1))]
    pub major: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub resume: Option<String>,
    #[serde(default)]
    pub coding_experience: Option<CodingExperience>,
    #[serde(rename = "eighteenBeforeEvent", default, deserialize_with = "flexible::boolean")]
    #[validate(custom(function = "must_be_true"))]
    pub eighteen_before_event: bool,
    #[serde(default, deserialize_with = "flexible::boolean")]
    #[validate(custom(function = "must_be_true"))]
    pub mlh_coc: bool,
    #[serde(default, deserialize_with = "flexible::boolean")]
    #[validate(custom(function = "must_be_true"))]
    pub mlh_dcp: bool,
    #[serde(default)]
    pub referral: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub expectations: Option<String>,
    pub veteran: VeteranOptions,
    #[serde(default, deserialize_with = "flexible::opt_epoch")]
    pub time: Option<EpochMillis>,
    #[serde(default)]
    pub hackathon: Option<Uid>,
    #[serde(default, deserialize_with = "flexible::boolean")]
    pub submitted: bool,
    #[serde(default, deserialize_with = "flexible::opt_int")]
    pub pin: Option<i64>,
    #[serde(default, deserialize_with = "flexible::opt_boolean")]
    pub share_address_mlh: Option<bool>,
    #[serde(default, deserialize_with = "flexible::opt_boolean")]
    pub share_address_sponsors: Option<bool>,
    #[serde(default, deserialize_with = "flexible::opt_boolean")]
    pub share_email_mlh: Option<bool>,
    #[serde(default)]
    pub word_pin: Option<String>,
}

impl Entity for Registration {}

fn must_be_true(value: &bool) -> Result<(), ValidationError> {
    if *value {
        Ok(())
    } else {
        let mut err = ValidationError::new("const");
        err.message = Some("should be equal to constant".into());
        Err(err)
    }
}

/// Registration form as submitted through the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationApiModel {
    pub uid: Option<Uid>,
    pub time: Option<EpochMillis>,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub shirt_size: ShirtSize,
    pub dietary_restriction: Option<String>,
    pub allergies: Option<String>,
    #[serde(default)]
    pub travel_reimbursement: bool,
    #[serde(default)]
    pub driving: bool,
    #[serde(default)]
    pub first_hackathon: bool,
    pub university: String,
    pub email: String,
    pub academic_year: AcademicYear,
    pub educational_institution_type: Option<EducationalInstitutionType>,
    pub major: String,
    pub phone: String,
    pub country: Option<String>,
    pub ethnicity: Option<String>,
    pub resume: Option<String>,
    pub coding_experience: Option<CodingExperience>,
    #[serde(default)]
    pub eighteen_before_event: bool,
    #[serde(default, rename = "mlhcoc")]
    pub mlh_coc: bool,
    #[serde(default, rename = "mlhdcp")]
    pub mlh_dcp: bool,
    pub referral: Option<String>,
    pub project_desc: Option<String>,
    pub expectations: Option<String>,
    pub veteran: VeteranOptions,
    #[serde(default)]
    pub submitted: bool,
    pub share_address_mlh: Option<bool>,
    pub share_address_sponsors: Option<bool>,
    pub share_email_mlh: Option<bool>,
    pub word_pin: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<RegistrationApiModel> for Registration {
    fn from(api: RegistrationApiModel) -> Self {
        Self {
            uid: api.uid,
            firstname: api.first_name,
            lastname: api.last_name,
            gender: api.gender,
            shirt_size: api.shirt_size,
            dietary_restriction: non_empty(api.dietary_restriction),
            allergies: non_empty(api.allergies),
            travel_reimbursement: api.travel_reimbursement,
            driving: api.driving,
            first_hackathon: api.first_hackathon,
            university: api.university,
            email: api.email,
            academic_year: api.academic_year,
            educational_institution_type: api.educational_institution_type,
            major: api.major,
            phone: api.phone,
            country: api.country,
            race: api.ethnicity,
            resume: api.resume,
            coding_experience: api.coding_experience,
            eighteen_before_event: api.eighteen_before_event,
            mlh_coc: api.mlh_coc,
            mlh_dcp: api.mlh_dcp,
            referral: api.referral,
            project: api.project_desc,
            expectations: api.expectations,
            veteran: api.veteran,
            time: api.time,
            hackathon: None,
            submitted: api.submitted,
            pin: None,
            share_address_mlh: Some(api.share_address_mlh.unwrap_or(false)),
            share_address_sponsors: Some(api.share_address_sponsors.unwrap_or(false)),
            share_email_mlh: Some(api.share_email_mlh.unwrap_or(false)),
            word_pin: Some(api.word_pin.unwrap_or_default()),
        }
    }
}

/// Columns summarized by the registration statistics query.
pub const STATS_COLUMNS: [&str; 9] = [
    "academic_year",
    "coding_experience",
    "dietary_restriction",
    "travel_reimbursement",
    "race",
    "shirt_size",
    "gender",
    "first_hackathon",
    "veteran",
];

/// One group of the registration statistics: how many registrations
/// answered `option` for `category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationStat {
    #[serde(rename = "CATEGORY")]
    pub category: String,
    #[serde(rename = "OPTION", default)]
    pub option: serde_json::Value,
    #[serde(rename = "COUNT", default, deserialize_with = "flexible::opt_int")]
    pub count: Option<i64>,
}
