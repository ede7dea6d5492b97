use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use sparqlmap_core::vocab::xsd;
use sparqlmap_core::{
    CountingSource, DescriptorBuilder, InMemoryGraph, LazyEntity, Literal, LoadState, MappingError,
    Node, PrefixTable, RdfEntity, SparqlTemplate, TemplateConfig, TransportError, Triple,
    TripleSource,
};

const EX: &str = "http://example.org/";

fn ex(local: &str) -> String {
    format!("{EX}{local}")
}

#[derive(Debug, Default)]
struct Country {
    common_name: String,
}

impl RdfEntity for Country {
    fn describe(b: DescriptorBuilder<Self>) -> DescriptorBuilder<Self> {
        b.prefix("ex", EX)
            .scalar(("commonName", "ex"), |c, v: String| c.common_name = v)
    }
}

#[derive(Debug, Default)]
struct Person {
    birth_name: String,
    birth_year: i32,
    hobby: HashSet<String>,
    citizenship: Option<LazyEntity<Country>>,
}

impl RdfEntity for Person {
    fn describe(b: DescriptorBuilder<Self>) -> DescriptorBuilder<Self> {
        b.prefix("ex", EX)
            .scalar(("birthName", "ex"), |p, v: String| p.birth_name = v)
            .scalar(("birthYear", "ex"), |p, v: i32| p.birth_year = v)
            .scalar_set(("hobby", "ex"), |p, v: HashSet<String>| p.hobby = v)
            .association(("citizenship", "ex"), |p, c: LazyEntity<Country>| {
                p.citizenship = Some(c)
            })
    }
}

/// A node whose only property points at another node of the same type.
#[derive(Debug, Default)]
struct Link {
    next: Option<LazyEntity<Link>>,
}

impl RdfEntity for Link {
    fn describe(b: DescriptorBuilder<Self>) -> DescriptorBuilder<Self> {
        b.prefix("ex", EX)
            .association(("next", "ex"), |l, next: LazyEntity<Link>| l.next = Some(next))
    }
}

/// A person with one extra property; the person mapping is reused as is.
#[derive(Debug, Default)]
struct Actor {
    person: Person,
    debut_year: i32,
}

impl RdfEntity for Actor {
    fn describe(b: DescriptorBuilder<Self>) -> DescriptorBuilder<Self> {
        b.embed(|a: &mut Actor| &mut a.person)
            .scalar(("debutYear", "ex"), |a, v: i32| a.debut_year = v)
    }
}

#[derive(Debug, Default)]
struct City {
    name: String,
}

impl RdfEntity for City {
    fn describe(b: DescriptorBuilder<Self>) -> DescriptorBuilder<Self> {
        b.prefix("ex", EX).scalar(("name", "ex"), |c, v: String| c.name = v)
    }
}

fn person_graph() -> InMemoryGraph {
    let person = ex("Person1");
    let country = ex("CountryX");
    vec![
        Triple::new(&person, ex("birthName"), Literal::plain("Jane Doe")),
        Triple::new(&person, ex("birthYear"), Literal::typed("1980", xsd::INTEGER)),
        Triple::new(&person, ex("hobby"), Literal::plain("chess")),
        Triple::new(&person, ex("hobby"), Literal::plain("chess")),
        Triple::new(&person, ex("hobby"), Literal::plain("reading")),
        Triple::new(&person, ex("citizenship"), Node::iri(&country)),
        Triple::new(&country, ex("commonName"), Literal::plain("Freedonia")),
    ]
    .into_iter()
    .collect()
}

fn counted(graph: InMemoryGraph) -> (SparqlTemplate, Arc<CountingSource<InMemoryGraph>>) {
    let source = Arc::new(CountingSource::new(graph));
    let template = SparqlTemplate::from_shared(source.clone(), TemplateConfig::default());
    (template, source)
}

#[test]
fn person_scenario_end_to_end() {
    let (template, source) = counted(person_graph());

    let jane = template.load::<Person>("http://example.org/Person1").unwrap();
    assert_eq!(source.calls(), 0);

    let person = jane.get().unwrap();
    assert_eq!(person.birth_name, "Jane Doe");
    assert_eq!(person.birth_year, 1980);
    assert_eq!(
        person.hobby,
        HashSet::from(["chess".to_string(), "reading".to_string()])
    );
    assert_eq!(source.calls(), 1);

    let citizenship = person.citizenship.as_ref().unwrap();
    assert_eq!(citizenship.iri(), ex("CountryX"));
    assert_eq!(citizenship.state(), LoadState::Unloaded);
    assert_eq!(source.calls(), 1);

    assert_eq!(citizenship.get().unwrap().common_name, "Freedonia");
    assert_eq!(source.calls(), 2);
}

#[test]
fn handles_fetch_once_and_only_on_access() {
    let (template, source) = counted(person_graph());

    let jane = template.load::<Person>(&ex("Person1")).unwrap();
    assert!(!jane.is_loaded());
    assert!(jane.peek().is_none());
    assert_eq!(source.calls(), 0);

    assert_eq!(jane.with(|p| p.birth_year).unwrap(), 1980);
    assert_eq!(source.calls(), 1);

    for _ in 0..5 {
        assert_eq!(jane.with(|p| p.birth_name.clone()).unwrap(), "Jane Doe");
        assert_eq!(jane.with(|p| p.hobby.len()).unwrap(), 2);
    }
    assert!(jane.is_loaded());
    assert_eq!(source.calls(), 1);
}

#[test]
fn separate_handles_for_one_iri_load_independently() {
    let (template, source) = counted(person_graph());

    let a = template.load::<Person>(&ex("Person1")).unwrap();
    let b = template.load::<Person>(&ex("Person1")).unwrap();
    a.get().unwrap();
    assert!(!b.is_loaded());
    b.get().unwrap();
    assert_eq!(source.calls(), 2);
}

#[test]
fn self_reference_yields_fresh_handles() {
    let a = ex("A");
    let graph: InMemoryGraph = std::iter::once(Triple::new(&a, ex("next"), Node::iri(&a))).collect();
    let (template, source) = counted(graph);

    let root = template.load::<Link>(&a).unwrap();
    let h1 = root.get().unwrap().next.as_ref().unwrap();
    assert_eq!(h1.iri(), a);
    assert!(!std::ptr::eq(h1, &root));
    assert!(!h1.is_loaded());

    let h2 = h1.get().unwrap().next.as_ref().unwrap();
    assert!(!std::ptr::eq(h2, h1));
    assert!(!h2.is_loaded());
    assert_eq!(source.calls(), 2);
}

#[test]
fn missing_scalar_reports_cardinality() {
    let person = ex("Person2");
    let graph: InMemoryGraph = vec![
        Triple::new(&person, ex("birthName"), Literal::plain("John")),
        Triple::new(&person, ex("citizenship"), Node::iri(ex("CountryX"))),
    ]
    .into_iter()
    .collect();
    let template = SparqlTemplate::new(graph);

    let handle = template.load::<Person>(&person).unwrap();
    let err = handle.get().unwrap_err();
    match &err {
        MappingError::Cardinality {
            subject,
            property,
            found,
            ..
        } => {
            assert_eq!(subject, &person);
            assert_eq!(property, "birthYear");
            assert_eq!(*found, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("birthYear"));
    assert!(!handle.is_loaded());
}

#[test]
fn literal_association_object_is_not_matched() {
    let person = ex("Person3");
    let graph: InMemoryGraph = vec![
        Triple::new(&person, ex("birthName"), Literal::plain("Ann")),
        Triple::new(&person, ex("birthYear"), Literal::typed("1970", xsd::INTEGER)),
        Triple::new(&person, ex("citizenship"), Literal::plain("Freedonia")),
    ]
    .into_iter()
    .collect();
    let template = SparqlTemplate::new(graph);

    let err = template.load::<Person>(&person).unwrap().get().unwrap_err();
    assert!(matches!(
        err,
        MappingError::Cardinality { ref property, found: 0, .. } if property == "citizenship"
    ));
}

/// Fails the first `failures` fetches, then delegates.
struct Flaky {
    inner: InMemoryGraph,
    failures: AtomicUsize,
}

impl TripleSource for Flaky {
    fn fetch_triples(&self, subject: &str, prefixes: &PrefixTable) -> Result<Vec<Triple>, TransportError> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(TransportError::Request {
                endpoint: "memory".to_string(),
                message: "connection reset".to_string(),
            });
        }
        self.inner.fetch_triples(subject, prefixes)
    }
}

#[test]
fn transport_failure_leaves_handle_unloaded_and_retry_succeeds() {
    let template = SparqlTemplate::new(Flaky {
        inner: person_graph(),
        failures: AtomicUsize::new(1),
    });

    let jane = template.load::<Person>(&ex("Person1")).unwrap();
    let err = jane.get().unwrap_err();
    assert!(matches!(err, MappingError::Transport(TransportError::Request { .. })));
    assert_eq!(jane.state(), LoadState::Unloaded);

    assert_eq!(jane.get().unwrap().birth_name, "Jane Doe");
    assert_eq!(jane.state(), LoadState::Loaded);
}

#[test]
fn concurrent_first_access_fetches_once() {
    let (template, source) = counted(person_graph());
    let jane = Arc::new(template.load::<Person>(&ex("Person1")).unwrap());

    let workers: Vec<_> = (0..16)
        .map(|_| {
            let jane = Arc::clone(&jane);
            thread::spawn(move || jane.with(|p| p.birth_year).unwrap())
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().unwrap(), 1980);
    }
    assert_eq!(source.calls(), 1);
}

#[test]
fn into_inner_loads_on_demand() {
    let (template, source) = counted(person_graph());
    let jane = template.load::<Person>(&ex("Person1")).unwrap();
    let person = jane.into_inner().unwrap();
    assert_eq!(person.birth_name, "Jane Doe");
    assert_eq!(source.calls(), 1);
}

#[test]
fn embedded_mapping_loads_in_one_fetch() {
    let graph = person_graph();
    graph.insert(Triple::new(
        ex("Person1"),
        ex("debutYear"),
        Literal::typed("2001", xsd::INTEGER),
    ));
    let (template, source) = counted(graph);

    let jane = template.load::<Actor>(&ex("Person1")).unwrap();
    let actor = jane.get().unwrap();
    assert_eq!(actor.debut_year, 2001);
    assert_eq!(actor.person.birth_name, "Jane Doe");
    assert_eq!(actor.person.hobby.len(), 2);
    assert_eq!(source.calls(), 1);

    let country = actor.person.citizenship.as_ref().unwrap();
    assert_eq!(country.get().unwrap().common_name, "Freedonia");
    assert_eq!(source.calls(), 2);
}

fn city_template(names: Vec<Literal>, language: Option<&str>) -> SparqlTemplate {
    let graph: InMemoryGraph = names
        .into_iter()
        .map(|name| Triple::new(ex("Paris"), ex("name"), name))
        .collect();
    let config = TemplateConfig {
        default_language: language.map(str::to_string),
        ..TemplateConfig::default()
    };
    SparqlTemplate::with_config(graph, config)
}

fn city_name(template: &SparqlTemplate) -> Result<String, MappingError> {
    template
        .load::<City>(&ex("Paris"))?
        .with(|c| c.name.clone())
}

#[test]
fn tagged_literals_resolve_to_one_value() {
    let both = vec![Literal::lang("Paris", "en"), Literal::lang("Parigi", "it")];
    assert_eq!(city_name(&city_template(both.clone(), None)).unwrap(), "Paris");
    assert_eq!(city_name(&city_template(both, Some("it"))).unwrap(), "Parigi");

    let mixed = vec![Literal::plain("Paris (plain)"), Literal::lang("Paris", "en")];
    assert_eq!(city_name(&city_template(mixed.clone(), Some("en"))).unwrap(), "Paris");
    assert_eq!(city_name(&city_template(mixed, Some("fr"))).unwrap(), "Paris (plain)");
}

#[test]
fn two_untagged_literals_stay_ambiguous() {
    let plain = vec![Literal::plain("Paris"), Literal::plain("Lutetia")];
    let err = city_name(&city_template(plain, Some("en"))).unwrap_err();
    assert!(matches!(err, MappingError::Cardinality { found: 2, .. }));
}
