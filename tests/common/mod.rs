//! Shared fixtures: two mapped entity types over an in-memory provider.

use chrono::NaiveDateTime;
use listquery::config::Settings;
use listquery::context::QueryContext;
use listquery::core::{EngineError, EngineResult, FieldType, ScalarValue};
use listquery::entity::{LookupCollectionRef, LookupRef};
use listquery::metadata::{ChoiceMember, Entity, EntityMeta, FieldDescriptor, FieldValue};
use listquery::provider::{MemoryProvider, Row, TabularProvider};
use std::rc::Rc;

pub const TAG_RED: u64 = 0x1;
pub const TAG_GREEN: u64 = 0x2;
pub const TAG_DARK_BLUE: u64 = 0x4;

static TAG_MEMBERS: [ChoiceMember; 3] = [
    ChoiceMember::new("Red", TAG_RED),
    ChoiceMember::new("Green", TAG_GREEN),
    ChoiceMember::named("DarkBlue", "Dark Blue", TAG_DARK_BLUE),
];

const PERSON_KEY: FieldDescriptor = FieldDescriptor::new("id", "ID", FieldType::Counter);
static PERSON_FIELDS: [FieldDescriptor; 3] = [
    PERSON_KEY,
    FieldDescriptor::new("name", "Title", FieldType::Text),
    FieldDescriptor::new("dept", "Dept", FieldType::Text),
];
static PERSON_META: EntityMeta = EntityMeta {
    list: "People",
    version: "1",
    check_version: None,
    key: &PERSON_KEY,
    fields: &PERSON_FIELDS,
};

#[derive(Debug, Default)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub dept: String,
}

impl Entity for Person {
    fn meta() -> &'static EntityMeta {
        &PERSON_META
    }

    fn apply(
        &mut self,
        field: &FieldDescriptor,
        value: FieldValue,
        _ctx: &QueryContext,
    ) -> EngineResult<()> {
        match (field.property, value) {
            ("id", FieldValue::Scalar(ScalarValue::Int(n))) => self.id = n,
            ("name", FieldValue::Scalar(ScalarValue::Text(s))) => self.name = s,
            ("dept", FieldValue::Scalar(ScalarValue::Text(s))) => self.dept = s,
            (property, value) => {
                return Err(EngineError::configuration(format!(
                    "Person binder cannot apply {value:?} to '{property}'"
                )))
            }
        }
        Ok(())
    }
}

const TASK_KEY: FieldDescriptor = FieldDescriptor::new("id", "ID", FieldType::Counter);
static TASK_FIELDS: [FieldDescriptor; 11] = [
    TASK_KEY,
    FieldDescriptor::new("title", "Title", FieldType::Text),
    // Second property over the same backend column; projection synthesis
    // must still emit the column once.
    FieldDescriptor::new("title_copy", "Title", FieldType::Text),
    FieldDescriptor::new("done", "Done", FieldType::Boolean),
    FieldDescriptor::new("estimate", "Estimate", FieldType::Number),
    FieldDescriptor::new("due", "Due", FieldType::DateTime),
    FieldDescriptor::new("score", "Score", FieldType::Number).calculated(),
    FieldDescriptor::new("tags", "Tags", FieldType::MultiChoice)
        .with_choices(&TAG_MEMBERS)
        .with_other("tags_other"),
    FieldDescriptor::new("tags_other", "TagsOther", FieldType::Text),
    FieldDescriptor::new("owner", "Owner", FieldType::Lookup).with_lookup("People"),
    FieldDescriptor::new("reviewers", "Reviewers", FieldType::LookupMulti).with_lookup("People"),
];
static TASK_META: EntityMeta = EntityMeta {
    list: "Tasks",
    version: "3",
    check_version: None,
    key: &TASK_KEY,
    fields: &TASK_FIELDS,
};

#[derive(Debug, Default)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub title_copy: String,
    pub done: bool,
    pub estimate: f64,
    pub due: Option<NaiveDateTime>,
    pub score: f64,
    pub tags: u64,
    pub tags_other: Option<String>,
    pub owner: Option<LookupRef<Person>>,
    pub reviewers: Option<LookupCollectionRef<Person>>,
}

impl Entity for Task {
    fn meta() -> &'static EntityMeta {
        &TASK_META
    }

    fn apply(
        &mut self,
        field: &FieldDescriptor,
        value: FieldValue,
        ctx: &QueryContext,
    ) -> EngineResult<()> {
        match (field.property, value) {
            ("id", FieldValue::Scalar(ScalarValue::Int(n))) => self.id = n,
            ("title", FieldValue::Scalar(ScalarValue::Text(s))) => self.title = s,
            ("title_copy", FieldValue::Scalar(ScalarValue::Text(s))) => self.title_copy = s,
            ("done", FieldValue::Scalar(ScalarValue::Bool(b))) => self.done = b,
            ("estimate", FieldValue::Scalar(ScalarValue::Float(x))) => self.estimate = x,
            ("due", FieldValue::Scalar(ScalarValue::DateTime(dt))) => self.due = Some(dt),
            ("score", FieldValue::Scalar(ScalarValue::Float(x))) => self.score = x,
            ("tags", FieldValue::Flags(flags)) => self.tags = flags,
            ("tags_other", FieldValue::Scalar(ScalarValue::Text(s))) => self.tags_other = Some(s),
            ("owner", FieldValue::Lookup(id)) => self.owner = Some(LookupRef::bind(ctx, id)?),
            ("reviewers", FieldValue::LookupMulti(ids)) => {
                self.reviewers = Some(LookupCollectionRef::bind(ctx, ids)?)
            }
            (property, value) => {
                return Err(EngineError::configuration(format!(
                    "Task binder cannot apply {value:?} to '{property}'"
                )))
            }
        }
        Ok(())
    }
}

pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn people_rows() -> Vec<Row> {
    vec![
        row(&[("ID", "101"), ("Title", "Ann"), ("Dept", "Eng")]),
        row(&[("ID", "102"), ("Title", "Bob"), ("Dept", "Ops")]),
    ]
}

pub fn task_rows() -> Vec<Row> {
    vec![
        row(&[
            ("ID", "1"),
            ("Title", "Draft brief"),
            ("Done", "1"),
            ("Estimate", "3.5"),
            ("Due", "2024-06-01T00:00:00Z"),
            ("Score", "float;#10.5"),
            ("Tags", "Red;#Dark Blue"),
            ("Owner", "101#Ann"),
            ("Reviewers", "101#Ann;#102#Bob"),
        ]),
        row(&[
            ("ID", "2"),
            ("Title", "Review brief"),
            ("Done", "0"),
            ("Estimate", "2"),
            ("Tags", "Green;#Purple"),
            ("Owner", "102#Bob"),
        ]),
        row(&[("ID", "3"), ("Title", "Ship"), ("Done", "0"), ("Estimate", "2")]),
    ]
}

pub fn fixture_provider() -> Rc<MemoryProvider> {
    let provider = Rc::new(MemoryProvider::new());
    provider.add_list("Tasks", "3", task_rows());
    provider.add_list("People", "1", people_rows());
    provider
}

pub fn context(provider: Rc<MemoryProvider>) -> QueryContext {
    QueryContext::new(provider as Rc<dyn TabularProvider>)
}

pub fn context_with(provider: Rc<MemoryProvider>, settings: Settings) -> QueryContext {
    QueryContext::with_settings(provider as Rc<dyn TabularProvider>, settings)
}
