// ============================================================================
// Décodage tolérant des lignes wire
// ============================================================================
// Le backend renvoie un tableau JSON de lignes. Un champ mal typé ("Date": null,
// "Close": "n/a", ...) ne doit pas faire échouer le décodage du tableau : il est
// décodé en une valeur que le normaliseur rejette (date illisible, prix absent),
// et la ligne est alors ignorée et comptée.
//
// CONCEPT RUST : #[serde(deserialize_with = "...")]
// - On passe par serde_json::Value puis on interprète à la main
// ============================================================================

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Texte tel quel ; toute autre valeur est gardée sous sa forme JSON brute
/// (ex: `null`, `20230103`) pour apparaître dans l'erreur de date
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        other => other.to_string(),
    })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Prix optionnel : nombre (ou nombre en texte), sinon None
pub(crate) fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?))
}

/// Prix obligatoire : NaN si illisible, rejeté ensuite comme non fini
pub(crate) fn lenient_required_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?).unwrap_or(f64::NAN))
}

pub(crate) fn missing_price() -> f64 {
    f64::NAN
}

/// Volume : entier, ou flottant positif (`1.0e8`) arrondi
pub(crate) fn lenient_volume<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().or_else(|| {
        number(&value)
            .filter(|v| v.is_finite() && *v >= 0.0 && *v <= u64::MAX as f64)
            .map(|v| v.round() as u64)
    }))
}

/// Décode un tableau de lignes, élément par élément
///
/// Un élément qui n'est même pas un objet devient une ligne illisible via
/// `unreadable` (sa date est le JSON brut) : elle sera comptée par le normaliseur.
pub(crate) fn decode_rows<T>(values: Vec<Value>, unreadable: fn(String) -> T) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    values
        .into_iter()
        .map(|value| {
            let raw = value.to_string();
            serde_json::from_value(value).unwrap_or_else(|_| unreadable(raw))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "lenient_text")]
        text: String,
        #[serde(default, deserialize_with = "lenient_price")]
        price: Option<f64>,
        #[serde(default, deserialize_with = "lenient_volume")]
        volume: Option<u64>,
    }

    fn decode(value: Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_non_string_text_keeps_raw_json() {
        assert_eq!(decode(json!({"text": null})).text, "null");
        assert_eq!(decode(json!({"text": 20230103})).text, "20230103");
        assert_eq!(decode(json!({"text": "2023-01-03"})).text, "2023-01-03");
    }

    #[test]
    fn test_prices() {
        assert_eq!(decode(json!({"text": "", "price": 1.5})).price, Some(1.5));
        assert_eq!(decode(json!({"text": "", "price": "2.25"})).price, Some(2.25));
        assert_eq!(decode(json!({"text": "", "price": null})).price, None);
        assert_eq!(decode(json!({"text": "", "price": [1]})).price, None);
        assert_eq!(decode(json!({"text": ""})).price, None);
    }

    #[test]
    fn test_float_volume_is_accepted() {
        assert_eq!(decode(json!({"text": "", "volume": 1.0e8})).volume, Some(100_000_000));
        assert_eq!(decode(json!({"text": "", "volume": 42})).volume, Some(42));
        assert_eq!(decode(json!({"text": "", "volume": -3.0})).volume, None);
        assert_eq!(decode(json!({"text": "", "volume": true})).volume, None);
    }
}
