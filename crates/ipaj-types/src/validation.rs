use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::AppointmentDraft;

/// The five appointment fields, one per wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentField {
    Name,
    Email,
    Phone,
    PreferredDate,
    Description,
}

impl AppointmentField {
    pub const ALL: [AppointmentField; 5] = [
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::PreferredDate,
        Self::Description,
    ];

    /// Field collected at wizard step `step` (1-based).
    pub fn for_step(step: u8) -> Option<Self> {
        Self::ALL.get(usize::from(step).checked_sub(1)?).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Nome Completo",
            Self::Email => "E-mail válido",
            Self::Phone => "Telefone (mínimo 8 dígitos)",
            Self::PreferredDate => "Data do Atendimento",
            Self::Description => "Assunto",
        }
    }

    pub fn value<'a>(&self, draft: &'a AppointmentDraft) -> &'a str {
        match self {
            Self::Name => &draft.name,
            Self::Email => &draft.email,
            Self::Phone => &draft.phone,
            Self::PreferredDate => &draft.preferred_date,
            Self::Description => &draft.description,
        }
    }

    pub fn is_valid(&self, value: &str) -> bool {
        let trimmed = value.trim();
        match self {
            Self::Name | Self::PreferredDate | Self::Description => !trimmed.is_empty(),
            Self::Email => !trimmed.is_empty() && value.contains('@'),
            Self::Phone => trimmed.chars().count() >= 8,
        }
    }

    pub fn check(&self, draft: &AppointmentDraft) -> Result<(), ValidationError> {
        if self.is_valid(self.value(draft)) {
            Ok(())
        } else if *self == Self::Description {
            Err(ValidationError::DescriptionRequired)
        } else {
            Err(ValidationError::Field(*self))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Por favor, preencha o campo '{}' corretamente para continuar.", .0.label())]
    Field(AppointmentField),

    #[error("A descrição é obrigatória para agendar.")]
    DescriptionRequired,

    #[error("{0}")]
    Invalid(String),
}

/// Validate every field of a draft in step order, stopping at the first failure.
pub fn validate_draft(draft: &AppointmentDraft) -> Result<(), ValidationError> {
    AppointmentField::ALL
        .iter()
        .try_for_each(|field| field.check(draft))
}

/// International phone number: `+` followed by 9 to 16 digits, whitespace ignored.
pub fn normalize_intl_phone(raw: &str) -> Option<String> {
    let clean: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = clean.strip_prefix('+')?;
    if (9..=16).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(clean)
    } else {
        None
    }
}

pub fn is_totp_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_draft() -> AppointmentDraft {
        AppointmentDraft {
            name: "Ana".into(),
            email: "a@b.com".into(),
            phone: "812345678".into(),
            preferred_date: "2025-12-01".into(),
            description: "Divórcio".into(),
        }
    }

    #[test]
    fn step_mapping() {
        assert_eq!(AppointmentField::for_step(0), None);
        assert_eq!(AppointmentField::for_step(1), Some(AppointmentField::Name));
        assert_eq!(AppointmentField::for_step(5), Some(AppointmentField::Description));
        assert_eq!(AppointmentField::for_step(6), None);
    }

    #[test]
    fn field_rules() {
        assert!(!AppointmentField::Name.is_valid("   "));
        assert!(!AppointmentField::Email.is_valid("ana.example.com"));
        assert!(AppointmentField::Email.is_valid("ana@example.com"));
        assert!(!AppointmentField::Phone.is_valid(" 1234567 "));
        assert!(AppointmentField::Phone.is_valid("84 123 45"));
    }

    #[test]
    fn draft_validation_reports_first_failure() {
        assert_eq!(validate_draft(&full_draft()), Ok(()));

        let mut draft = full_draft();
        draft.phone = "123".into();
        draft.description.clear();
        assert_eq!(
            validate_draft(&draft),
            Err(ValidationError::Field(AppointmentField::Phone))
        );

        draft.phone = "812345678".into();
        assert_eq!(validate_draft(&draft), Err(ValidationError::DescriptionRequired));
    }

    #[test]
    fn message_names_the_field() {
        let msg = ValidationError::Field(AppointmentField::Name).to_string();
        assert!(msg.contains("'Nome Completo'"));
    }

    #[test]
    fn intl_phone() {
        assert_eq!(normalize_intl_phone("+258 84 123 4567").as_deref(), Some("+258841234567"));
        assert_eq!(normalize_intl_phone("841234567"), None);
        assert_eq!(normalize_intl_phone("+2588"), None);
    }

    #[test]
    fn totp_code_shape() {
        assert!(is_totp_code("012345"));
        assert!(!is_totp_code("12345"));
        assert!(!is_totp_code("12a456"));
    }
}
