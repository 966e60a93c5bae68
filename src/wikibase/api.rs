// src/wikibase/api.rs
// MediaWiki Action API client for a Wikibase repository (blocking).

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::debug;

use super::value::{decode_statement, encode_target};
use super::{ClaimId, ItemId, KbError, KnowledgeBase, Labels, PageRevision, PropertyId, Snak, Statement};

pub struct WikibaseApi {
    client: Client,
    api_url: String,
    concept_uri: String,
    token: String,
}

impl WikibaseApi {
    /// Build the client and fetch an edit token. Failure here means the site
    /// configuration is unusable.
    pub fn connect(api_url: &str, concept_uri: &str, user_agent: &str, timeout: Duration) -> Result<Self, KbError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| KbError::Transport(e.to_string()))?;

        let mut api = Self {
            client,
            api_url: s!(api_url),
            concept_uri: s!(concept_uri),
            token: s!(),
        };
        let resp = api.get(&[("action", s!("query")), ("meta", s!("tokens")), ("type", s!("csrf"))])?;
        api.token = resp
            .pointer("/query/tokens/csrftoken")
            .and_then(Value::as_str)
            .ok_or_else(|| KbError::Decode(s!("missing csrf token")))?
            .to_string();
        Ok(api)
    }

    fn get(&self, params: &[(&str, String)]) -> Result<Value, KbError> {
        let resp = self
            .client
            .get(&self.api_url)
            .query(&[("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .map_err(classify_transport)?;
        read_json(resp)
    }

    fn post(&self, params: &[(&str, String)]) -> Result<Value, KbError> {
        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("format", s!("json")));
        form.push(("formatversion", s!("2")));
        form.push(("token", self.token.clone()));
        let resp = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()
            .map_err(classify_transport)?;
        read_json(resp)
    }

    fn labels_json(labels: &Labels) -> Value {
        let map: serde_json::Map<String, Value> = labels
            .iter()
            .map(|(lang, text)| (lang.clone(), json!({ "language": lang, "value": text })))
            .collect();
        json!({ "labels": map })
    }
}

fn classify_transport(e: reqwest::Error) -> KbError {
    if e.is_timeout() {
        KbError::Timeout(e.to_string())
    } else {
        KbError::Transport(e.to_string())
    }
}

fn read_json(resp: reqwest::blocking::Response) -> Result<Value, KbError> {
    let status = resp.status();
    if status.is_server_error() {
        return Err(KbError::Server(status.to_string()));
    }
    let body: Value = resp.json().map_err(|e| KbError::Decode(e.to_string()))?;
    if let Some(err) = body.get("error") {
        let code = err.get("code").and_then(Value::as_str).unwrap_or("unknown").to_string();
        let info = err.get("info").and_then(Value::as_str).unwrap_or_default().to_string();
        return Err(match code.as_str() {
            "editconflict" | "articleexists" | "pagedeleted" => KbError::EditConflict(info),
            "maxlag" | "readonly" | "ratelimited" => KbError::Server(join!(&code, ": ", &info)),
            "no-such-entity" | "missingtitle" => KbError::NotFound(info),
            _ => KbError::Rejected { code, info },
        });
    }
    Ok(body)
}

impl KnowledgeBase for WikibaseApi {
    fn create_item(&mut self, labels: &Labels, summary: &str) -> Result<ItemId, KbError> {
        let resp = self.post(&[
            ("action", s!("wbeditentity")),
            ("new", s!("item")),
            ("data", Self::labels_json(labels).to_string()),
            ("summary", s!(summary)),
        ])?;
        resp.pointer("/entity/id")
            .and_then(Value::as_str)
            .and_then(ItemId::parse)
            .ok_or_else(|| KbError::Decode(s!("wbeditentity returned no item id")))
    }

    fn set_labels(&mut self, item: &ItemId, labels: &Labels, summary: &str) -> Result<(), KbError> {
        self.post(&[
            ("action", s!("wbeditentity")),
            ("id", s!(item.as_str())),
            ("data", Self::labels_json(labels).to_string()),
            ("summary", s!(summary)),
        ])?;
        Ok(())
    }

    fn statements(&mut self, item: &ItemId, property: &PropertyId) -> Result<Vec<Statement>, KbError> {
        let resp = self.get(&[
            ("action", s!("wbgetclaims")),
            ("entity", s!(item.as_str())),
            ("property", s!(property.as_str())),
        ])?;
        let claims = resp
            .pointer(&format!("/claims/{property}"))
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|c| decode_statement(c, &self.concept_uri)).collect())
            .unwrap_or_default();
        Ok(claims)
    }

    fn add_claim(&mut self, item: &ItemId, snak: &Snak, summary: &str) -> Result<ClaimId, KbError> {
        let value = encode_target(&snak.target, &self.concept_uri);
        debug!(%item, property = %snak.property, %value, "wbcreateclaim");
        let resp = self.post(&[
            ("action", s!("wbcreateclaim")),
            ("entity", s!(item.as_str())),
            ("property", s!(snak.property.as_str())),
            ("snaktype", s!("value")),
            ("value", value.to_string()),
            ("summary", s!(summary)),
        ])?;
        resp.pointer("/claim/id")
            .and_then(Value::as_str)
            .map(|id| ClaimId(s!(id)))
            .ok_or_else(|| KbError::Decode(s!("wbcreateclaim returned no claim id")))
    }

    fn add_qualifier(&mut self, claim: &ClaimId, snak: &Snak, summary: &str) -> Result<(), KbError> {
        let value = encode_target(&snak.target, &self.concept_uri);
        self.post(&[
            ("action", s!("wbsetqualifier")),
            ("claim", claim.0.clone()),
            ("property", s!(snak.property.as_str())),
            ("snaktype", s!("value")),
            ("value", value.to_string()),
            ("summary", s!(summary)),
        ])?;
        Ok(())
    }

    fn read_page(&mut self, title: &str) -> Result<PageRevision, KbError> {
        let resp = self.get(&[
            ("action", s!("query")),
            ("prop", s!("revisions")),
            ("rvprop", s!("content|timestamp")),
            ("rvslots", s!("main")),
            ("curtimestamp", s!("1")),
            ("titles", s!(title)),
        ])?;
        Ok(page_revision(&resp))
    }

    fn save_page(&mut self, title: &str, text: &str, summary: &str, based_on: Option<&PageRevision>) -> Result<(), KbError> {
        self.post(&edit_form(title, text, summary, based_on))?;
        Ok(())
    }
}

fn page_revision(resp: &Value) -> PageRevision {
    let text_at = |path: &str| resp.pointer(path).and_then(Value::as_str).map(str::to_string);
    PageRevision {
        text: text_at("/query/pages/0/revisions/0/slots/main/content").unwrap_or_default(),
        base: text_at("/query/pages/0/revisions/0/timestamp"),
        start: text_at("/curtimestamp"),
    }
}

/// `action=edit` fields. A save based on an earlier read carries its
/// timestamps so a concurrent edit comes back as `editconflict`.
fn edit_form(title: &str, text: &str, summary: &str, based_on: Option<&PageRevision>) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("action", s!("edit")),
        ("title", s!(title)),
        ("text", s!(text)),
        ("summary", s!(summary)),
        ("minor", s!("1")),
    ];
    if let Some(rev) = based_on {
        match &rev.base {
            Some(base) => form.push(("basetimestamp", base.clone())),
            // read as missing: a page created meanwhile is a conflict too
            None => form.push(("createonly", s!("1"))),
        }
        if let Some(start) = &rev.start {
            form.push(("starttimestamp", start.clone()));
        }
    }
    form
}
