use std::collections::HashMap;

use crate::dataset::{GroupField, Record};

/// Raw grouping produced before normalization.
///
/// `Keyed` holds one entry per distinct key in first-appearance order.
/// `Records` sits below the title key and holds every record sharing all keys.
#[derive(Clone, Debug, PartialEq)]
pub enum RawGroup<'a> {
    Keyed(Vec<(&'a str, RawGroup<'a>)>),
    Records(Vec<&'a Record>),
}

#[derive(Clone, Copy, Debug)]
enum NestKey {
    Field(GroupField),
    Title,
}

impl NestKey {
    fn value(self, record: &Record) -> &str {
        match self {
            Self::Field(field) => record.field(field),
            Self::Title => &record.title,
        }
    }
}

/// Groups records by each field in turn, then by title.
pub fn nest<'a>(records: &[&'a Record], fields: &[GroupField]) -> RawGroup<'a> {
    let keys = fields
        .iter()
        .copied()
        .map(NestKey::Field)
        .chain(std::iter::once(NestKey::Title))
        .collect::<Vec<_>>();

    nest_by(records.to_vec(), &keys)
}

fn nest_by<'a>(records: Vec<&'a Record>, keys: &[NestKey]) -> RawGroup<'a> {
    let Some((&key, rest)) = keys.split_first() else {
        return RawGroup::Records(records);
    };

    let groups = group_by(records, key)
        .into_iter()
        .map(|(value, members)| (value, nest_by(members, rest)))
        .collect();

    RawGroup::Keyed(groups)
}

fn group_by<'a>(records: Vec<&'a Record>, key: NestKey) -> Vec<(&'a str, Vec<&'a Record>)> {
    let mut index_by_key: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, Vec<&'a Record>)> = Vec::new();

    for record in records {
        let value = key.value(record);
        match index_by_key.get(value) {
            Some(&index) => groups[index].1.push(record),
            None => {
                index_by_key.insert(value, groups.len());
                groups.push((value, vec![record]));
            }
        }
    }

    groups
}
