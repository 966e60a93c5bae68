// src/wikibase/memory.rs
// In-process knowledge base: deterministic ids, no network. Backs tests and --dry-run.

use std::collections::{BTreeMap, VecDeque};

use super::{ClaimId, ItemId, KbError, KnowledgeBase, Labels, PageRevision, PropertyId, Snak, Statement};

#[derive(Clone, Debug, Default)]
pub struct MemoryItem {
    pub labels: Labels,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Default)]
pub struct MemoryKnowledgeBase {
    items: BTreeMap<ItemId, MemoryItem>,
    /// Title → (text, revision number).
    pages: BTreeMap<String, (String, u64)>,
    revisions: u64,
    next_item: u64,
    next_claim: u64,
    claim_writes: usize,
    save_failures: VecDeque<KbError>,
    /// Edits made by "someone else" right after the next reads.
    foreign_edits: VecDeque<(String, String)>,
}

impl MemoryKnowledgeBase {
    pub fn new() -> Self { Self::default() }

    /// Seed an existing item (tests updating a known target).
    pub fn insert_item(&mut self, id: ItemId, labels: Labels) {
        self.next_item = self.next_item.max(id.number());
        self.items.insert(id, MemoryItem { labels, statements: Vec::new() });
    }

    pub fn set_page(&mut self, title: &str, text: &str) {
        self.revisions += 1;
        self.pages.insert(s!(title), (s!(text), self.revisions));
    }

    /// Overwrite `title` with `text` straight after the next `read_page`,
    /// as a concurrent writer would.
    pub fn edit_after_next_read(&mut self, title: &str, text: &str) {
        self.foreign_edits.push_back((s!(title), s!(text)));
    }

    /// The next `save_page` calls fail with these errors, in order.
    pub fn fail_next_saves(&mut self, errors: impl IntoIterator<Item = KbError>) {
        self.save_failures.extend(errors);
    }

    pub fn item(&self, id: &ItemId) -> Option<&MemoryItem> { self.items.get(id) }

    pub fn items(&self) -> impl Iterator<Item = (&ItemId, &MemoryItem)> { self.items.iter() }

    pub fn page(&self, title: &str) -> Option<&str> { self.pages.get(title).map(|(text, _)| text.as_str()) }

    /// Successful `add_claim` calls so far.
    pub fn claim_writes(&self) -> usize { self.claim_writes }

    fn item_mut(&mut self, id: &ItemId) -> Result<&mut MemoryItem, KbError> {
        self.items.get_mut(id).ok_or_else(|| KbError::NotFound(id.to_string()))
    }
}

impl KnowledgeBase for MemoryKnowledgeBase {
    fn create_item(&mut self, labels: &Labels, _summary: &str) -> Result<ItemId, KbError> {
        self.next_item += 1;
        let id = ItemId::from_number(self.next_item)
            .ok_or_else(|| KbError::Decode(s!("item counter overflow")))?;
        self.items.insert(id.clone(), MemoryItem { labels: labels.clone(), statements: Vec::new() });
        Ok(id)
    }

    fn set_labels(&mut self, item: &ItemId, labels: &Labels, _summary: &str) -> Result<(), KbError> {
        let entry = self.item_mut(item)?;
        entry.labels.extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn statements(&mut self, item: &ItemId, property: &PropertyId) -> Result<Vec<Statement>, KbError> {
        let entry = self.items.get(item).ok_or_else(|| KbError::NotFound(item.to_string()))?;
        Ok(entry.statements.iter().filter(|s| &s.mainsnak.property == property).cloned().collect())
    }

    fn add_claim(&mut self, item: &ItemId, snak: &Snak, _summary: &str) -> Result<ClaimId, KbError> {
        self.next_claim += 1;
        let id = ClaimId(format!("{item}${}", self.next_claim));
        let entry = self.item_mut(item)?;
        entry.statements.push(Statement { id: id.clone(), mainsnak: snak.clone(), qualifiers: Vec::new() });
        self.claim_writes += 1;
        Ok(id)
    }

    fn add_qualifier(&mut self, claim: &ClaimId, snak: &Snak, _summary: &str) -> Result<(), KbError> {
        let statement = self
            .items
            .values_mut()
            .flat_map(|i| i.statements.iter_mut())
            .find(|s| &s.id == claim)
            .ok_or_else(|| KbError::NotFound(claim.0.clone()))?;
        statement.qualifiers.push(snak.clone());
        Ok(())
    }

    fn read_page(&mut self, title: &str) -> Result<PageRevision, KbError> {
        let rev = PageRevision {
            text: self.page(title).map(str::to_string).unwrap_or_default(),
            base: self.pages.get(title).map(|(_, n)| format!("r{n}")),
            start: Some(format!("r{}", self.revisions)),
        };
        if let Some((other, text)) = self.foreign_edits.pop_front() {
            self.set_page(&other, &text);
        }
        Ok(rev)
    }

    fn save_page(&mut self, title: &str, text: &str, _summary: &str, based_on: Option<&PageRevision>) -> Result<(), KbError> {
        if let Some(err) = self.save_failures.pop_front() {
            return Err(err);
        }
        if let Some(rev) = based_on {
            let current = self.pages.get(title).map(|(_, n)| format!("r{n}"));
            if current != rev.base {
                return Err(KbError::EditConflict(s!(title)));
            }
        }
        self.set_page(title, text);
        Ok(())
    }
}
