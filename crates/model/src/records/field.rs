use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The value type a contact field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Binary,
    Boolean,
}

/// Fields of a contact record that can be stored, filtered or sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    FullName,
    GivenName,
    FamilyName,
    Nickname,
    Email,
    Phone,
    Organization,
    Note,
    Birthday,
    Photo,
    IsList,
}

impl ContactField {
    pub const ALL: [ContactField; 11] = [
        ContactField::FullName,
        ContactField::GivenName,
        ContactField::FamilyName,
        ContactField::Nickname,
        ContactField::Email,
        ContactField::Phone,
        ContactField::Organization,
        ContactField::Note,
        ContactField::Birthday,
        ContactField::Photo,
        ContactField::IsList,
    ];

    pub fn kind(&self) -> FieldKind {
        match self {
            ContactField::Birthday => FieldKind::Date,
            ContactField::Photo => FieldKind::Binary,
            ContactField::IsList => FieldKind::Boolean,
            _ => FieldKind::Text,
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind() == FieldKind::Text
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContactField::FullName => "full_name",
            ContactField::GivenName => "given_name",
            ContactField::FamilyName => "family_name",
            ContactField::Nickname => "nickname",
            ContactField::Email => "email",
            ContactField::Phone => "phone",
            ContactField::Organization => "org",
            ContactField::Note => "note",
            ContactField::Birthday => "birth_date",
            ContactField::Photo => "photo",
            ContactField::IsList => "list",
        }
    }
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContactField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "full_name" | "fullname" | "fn" => Ok(ContactField::FullName),
            "given_name" | "givenname" => Ok(ContactField::GivenName),
            "family_name" | "familyname" | "surname" => Ok(ContactField::FamilyName),
            "nickname" => Ok(ContactField::Nickname),
            "email" => Ok(ContactField::Email),
            "phone" | "tel" => Ok(ContactField::Phone),
            "org" | "organization" => Ok(ContactField::Organization),
            "note" => Ok(ContactField::Note),
            "birth_date" | "birthday" => Ok(ContactField::Birthday),
            "photo" => Ok(ContactField::Photo),
            "list" | "is_list" => Ok(ContactField::IsList),
            _ => Err(format!("unknown contact field '{s}'")),
        }
    }
}
