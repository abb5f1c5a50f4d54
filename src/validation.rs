use garde::Validate;
use serde::Serialize;

#[derive(Validate, Clone, Serialize, Debug, PartialEq, Eq)]
pub struct ValidatedEmail(
    #[garde(email)]
    pub(crate) String
);

impl ValidatedEmail {
    pub fn parse(s: &str) -> Result<Self, garde::Report> {
        let email = ValidatedEmail(s.to_string());
        email.validate()?;
        Ok(email)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
