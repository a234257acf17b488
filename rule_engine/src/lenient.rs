//! Fail-closed deserialization for tagged rule enums.
//!
//! Rule families are closed, internally tagged enums. A rule file written for
//! a newer engine may still carry a tag this build does not know; instead of
//! rejecting the whole file, such a rule deserializes into the family's
//! `Unrecognized { type_name }` variant, which evaluates to a failing result.
//! A known tag with malformed fields is still a hard parse error.
//!
//! Each enum using this derives `Serialize`/`Deserialize` with
//! `#[serde(remote = "Self")]`, declares `TYPE_NAMES`, and marks its
//! `Unrecognized` variant `#[serde(skip)]`.

macro_rules! lenient_rule_enum {
    ($ty:ident) => {
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                $ty::serialize(self, serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                let type_name = value
                    .get("type")
                    .and_then(|tag| tag.as_str())
                    .map(str::to_owned);

                match $ty::deserialize(value) {
                    Ok(rule) => Ok(rule),
                    Err(err) => match type_name {
                        Some(name) if !$ty::TYPE_NAMES.contains(&name.as_str()) => {
                            Ok($ty::Unrecognized { type_name: name })
                        }
                        _ => Err(<D::Error as serde::de::Error>::custom(err)),
                    },
                }
            }
        }
    };
}
