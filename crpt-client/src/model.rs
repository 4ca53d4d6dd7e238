use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

/// An "introduce goods into circulation" document.
///
/// Every field may be absent or `null` on the way in, and an unset field is
/// written out as `null` rather than dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub description: Option<Description>,
    pub doc_id: Option<String>,
    pub doc_status: Option<String>,
    pub doc_type: Option<String>,
    #[serde(rename = "importRequest", deserialize_with = "null_as_false")]
    pub import_request: bool,
    pub owner_inn: Option<String>,
    pub participant_inn: Option<String>,
    pub producer_inn: Option<String>,
    pub production_date: Option<NaiveDate>,
    pub production_type: Option<String>,
    pub products: Option<Vec<Product>>,
    #[serde(with = "reg_date")]
    pub reg_date: Option<NaiveDateTime>,
    pub reg_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Description {
    #[serde(rename = "participantInn")]
    pub participant_inn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub certificate_document: Option<String>,
    pub certificate_document_date: Option<NaiveDate>,
    pub certificate_document_number: Option<String>,
    pub owner_inn: Option<String>,
    pub producer_inn: Option<String>,
    pub production_date: Option<NaiveDate>,
    pub tnved_code: Option<String>,
    pub uit_code: Option<String>,
    pub uitu_code: Option<String>,
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

/// `reg_date` travels without fractional seconds or offset.
mod reg_date {
    use chrono::NaiveDateTime;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de::Error;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(
        at: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match at {
            Some(at) => serializer.collect_str(&at.format(FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(D::Error::custom))
            .transpose()
    }
}
