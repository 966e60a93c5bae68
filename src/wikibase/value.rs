// src/wikibase/value.rs
// Wikibase datavalue JSON <-> Target.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::{Value, json};

use crate::core::normalize::YearMonth;
use crate::lookup::DIMENSIONLESS;

use super::{ClaimId, ItemId, PropertyId, Snak, Statement, Target};

/// Proleptic Gregorian calendar item.
const GREGORIAN: &str = "Q1985727";
/// Time precision "month".
const PRECISION_MONTH: u64 = 10;

/// The `value` parameter of `wbcreateclaim` / `wbsetqualifier`.
pub fn encode_target(target: &Target, concept_uri: &str) -> Value {
    match target {
        Target::Text(s) => Value::String(s.clone()),
        Target::Quantity { amount, unit } => {
            // never exponent form: Wikibase rejects "+1E-7"
            let rendered = amount.to_plain_string();
            let amount = if rendered.starts_with('-') { rendered } else { join!("+", &rendered) };
            let unit = match unit {
                Some(id) => format!("{concept_uri}{id}"),
                None => s!(DIMENSIONLESS),
            };
            json!({ "amount": amount, "unit": unit })
        }
        Target::Time(ym) => json!({
            "time": format!("+{:04}-{:02}-00T00:00:00Z", ym.year, ym.month),
            "timezone": 0,
            "before": 0,
            "after": 0,
            "precision": PRECISION_MONTH,
            "calendarmodel": format!("{concept_uri}{GREGORIAN}"),
        }),
        Target::Item(id) => json!({ "entity-type": "item", "numeric-id": id.number(), "id": id.as_str() }),
    }
}

/// Decode one snak; `somevalue`/`novalue` and unsupported datatypes yield `None`.
pub fn decode_snak(snak: &Value, concept_uri: &str) -> Option<Snak> {
    if snak.get("snaktype")?.as_str()? != "value" { return None; }
    let property = PropertyId::parse(snak.get("property")?.as_str()?)?;
    let datavalue = snak.get("datavalue")?;
    let value = datavalue.get("value")?;

    let target = match datavalue.get("type")?.as_str()? {
        "string" => Target::Text(value.as_str()?.to_string()),
        "quantity" => {
            let raw = value.get("amount")?.as_str()?;
            let amount = BigDecimal::from_str(raw.trim_start_matches('+')).ok()?;
            let unit = match value.get("unit")?.as_str()? {
                DIMENSIONLESS => None,
                uri => Some(ItemId::parse(uri.strip_prefix(concept_uri).unwrap_or(uri))?),
            };
            Target::Quantity { amount, unit }
        }
        "time" => Target::Time(decode_time(value.get("time")?.as_str()?)?),
        "wikibase-entityid" => {
            let id = match value.get("id").and_then(Value::as_str) {
                Some(id) => ItemId::parse(id)?,
                None => ItemId::from_number(value.get("numeric-id")?.as_u64()?)?,
            };
            Target::Item(id)
        }
        _ => return None,
    };
    Some(Snak { property, target })
}

/// `+2020-11-00T00:00:00Z` → 2020-11.
fn decode_time(raw: &str) -> Option<YearMonth> {
    let body = raw.trim_start_matches('+');
    let mut parts = body.splitn(3, '-');
    let year = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    Some(YearMonth { year, month })
}

pub fn decode_statement(claim: &Value, concept_uri: &str) -> Option<Statement> {
    let id = ClaimId(claim.get("id")?.as_str()?.to_string());
    let mainsnak = decode_snak(claim.get("mainsnak")?, concept_uri)?;
    let qualifiers = claim
        .get("qualifiers")
        .and_then(Value::as_object)
        .map(|by_prop| {
            by_prop
                .values()
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(|q| decode_snak(q, concept_uri))
                .collect()
        })
        .unwrap_or_default();
    Some(Statement { id, mainsnak, qualifiers })
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "http://www.wikidata.org/entity/";

    fn as_snak(prop: &str, kind: &str, value: Value) -> Value {
        json!({ "snaktype": "value", "property": prop, "datavalue": { "type": kind, "value": value } })
    }

    #[test]
    fn quantity_encoding() {
        let t = Target::Quantity {
            amount: BigDecimal::from_str("1.5").unwrap(),
            unit: ItemId::parse("Q3095871"),
        };
        let v = encode_target(&t, URI);
        assert_eq!(v["amount"], "+1.5");
        assert_eq!(v["unit"], "http://www.wikidata.org/entity/Q3095871");

        let bare = Target::Quantity { amount: BigDecimal::from(128), unit: None };
        assert_eq!(encode_target(&bare, URI)["unit"], "1");
    }

    #[test]
    fn tiny_and_negative_amounts_stay_plain() {
        let amount = |raw: &str| {
            let t = Target::Quantity { amount: crate::core::normalize::format_decimal(raw).unwrap(), unit: None };
            encode_target(&t, URI)["amount"].as_str().unwrap().to_string()
        };
        assert_eq!(amount("0.0000001"), "+0.0000001");
        assert_eq!(amount("0.000000120"), "+0.00000012");
        assert_eq!(amount("-0.5"), "-0.5");
        assert_eq!(amount("1200"), "+1200");
    }

    #[test]
    fn time_encoding_has_month_precision() {
        let v = encode_target(&Target::Time(YearMonth { year: 2020, month: 11 }), URI);
        assert_eq!(v["time"], "+2020-11-00T00:00:00Z");
        assert_eq!(v["precision"], 10);
    }

    #[test]
    fn decode_round_trips_what_we_write() {
        let targets = [
            Target::Text(s!("179")),
            Target::Quantity { amount: BigDecimal::from_str("10").unwrap(), unit: ItemId::parse("Q3079") },
            Target::Time(YearMonth { year: 1993, month: 6 }),
            Target::Item(ItemId::parse("Q37156").unwrap()),
        ];
        let kinds = ["string", "quantity", "time", "wikibase-entityid"];
        for (t, kind) in targets.iter().zip(kinds) {
            let raw = as_snak("P1", kind, encode_target(t, URI));
            let snak = decode_snak(&raw, URI).unwrap();
            assert_eq!(&snak.target, t);
        }
    }

    #[test]
    fn novalue_snaks_are_ignored() {
        let raw = json!({ "snaktype": "novalue", "property": "P31" });
        assert!(decode_snak(&raw, URI).is_none());
    }

    #[test]
    fn statement_collects_qualifiers() {
        let claim = json!({
            "id": "Q1$abc",
            "mainsnak": as_snak("P2149", "quantity", json!({ "amount": "+1.1", "unit": "1" })),
            "qualifiers": {
                "P2868": [as_snak("P2868", "wikibase-entityid", json!({ "id": "Q67201233" }))],
                "P585": [as_snak("P585", "time", json!({ "time": "+2020-11-00T00:00:00Z" }))]
            }
        });
        let st = decode_statement(&claim, URI).unwrap();
        assert_eq!(st.id, ClaimId(s!("Q1$abc")));
        assert_eq!(st.qualifiers.len(), 2);
    }
}
