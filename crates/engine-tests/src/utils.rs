//! The twenty-contact address book every integration test runs against.
//!
//! Family names are chosen so that case, accents, punctuation, German
//! umlauts and French accent ordering each change the sort order. Contact 11
//! has no family name and sorts first everywhere.

use model::{
    pagination::{sort::SortSpec, step::StepResult},
    records::{field::ContactField, record::Record},
};

pub const FAMILY_NAMES: [Option<&str>; 20] = [
    Some("bad"),
    Some("Bad"),
    Some("Bat"),
    Some("bat"),
    Some("bäd"),
    Some("Bäd"),
    Some("bät"),
    Some("Bät"),
    Some("Côté"),
    Some("Caron"),
    None,
    Some("Coté"),
    Some("Côte"),
    Some("Cote"),
    Some("black-bird"),
    Some("blackbird"),
    Some("black-birds"),
    Some("blackbirds"),
    Some("Muffler"),
    Some("Müller"),
];

/// Contacts whose email ends in `.com`.
pub const COM_CONTACTS: [usize; 13] = [1, 2, 3, 5, 8, 9, 10, 11, 12, 14, 16, 17, 20];

pub const POSIX_ORDER: [usize; 20] = [
    11, 2, 6, 3, 8, 1, 5, 4, 7, 15, 17, 16, 18, 10, 14, 12, 13, 9, 19, 20,
];
pub const EN_US_ORDER: [usize; 20] = [
    11, 1, 2, 5, 6, 4, 3, 7, 8, 15, 17, 16, 18, 10, 14, 12, 13, 9, 19, 20,
];
pub const FR_CA_ORDER: [usize; 20] = [
    11, 1, 2, 5, 6, 4, 3, 7, 8, 15, 17, 16, 18, 10, 14, 13, 12, 9, 19, 20,
];
pub const DE_DE_ORDER: [usize; 20] = [
    11, 1, 2, 5, 6, 7, 8, 4, 3, 15, 17, 16, 18, 10, 14, 12, 13, 9, 20, 19,
];

pub fn uid(n: usize) -> String {
    format!("sorted-{n}")
}

pub fn fixture_records() -> Vec<Record> {
    FAMILY_NAMES
        .iter()
        .enumerate()
        .map(|(i, family)| {
            let n = i + 1;
            let domain = if COM_CONTACTS.contains(&n) { "com" } else { "org" };
            let record = Record::new(uid(n))
                .with_field(ContactField::Email, format!("{}@example.{domain}", uid(n)));
            match family {
                Some(family) => record
                    .with_field(ContactField::FamilyName, *family)
                    .with_field(ContactField::FullName, format!("Contact {family}")),
                None => record,
            }
        })
        .collect()
}

pub fn by_name() -> SortSpec {
    SortSpec::ascending(&[ContactField::FamilyName, ContactField::GivenName])
}

/// Contact numbers of a page, in the order returned.
pub fn numbers(result: &StepResult) -> Vec<usize> {
    result
        .records
        .iter()
        .filter_map(|r| r.uid.strip_prefix("sorted-")?.parse().ok())
        .collect()
}
