//! Mapping templates as they appear in configuration files

use bson::{doc, oid::ObjectId};
use moredis_core::{QueryError, RunParameters, TemplateError};
use moredis_template::{build_query, render, Template};
use moredis_test_utils::fixtures::{params, sample_config};

#[test]
fn test_toset_examples() {
    let ctx = doc! { "x": { "a": true, "b": "false", "c": true } };
    assert_eq!(render("{{toSet .x}}", &ctx).unwrap(), "[a,c]");

    let ctx = doc! { "x": { "a": "maybe" } };
    assert_eq!(render("{{toSet .x}}", &ctx).unwrap(), "");
}

#[test]
fn test_tolower_examples() {
    assert_eq!(render("{{toLower nil}}", &doc! {}).unwrap(), "");
    assert_eq!(render(r#"{{toLower "ABC"}}"#, &doc! {}).unwrap(), "abc");
    assert_eq!(render("{{toLower .missing}}", &doc! {}).unwrap(), "");
}

#[test]
fn test_to_string_of_nil_and_missing() {
    assert_eq!(render("{{toString nil}}", &doc! {}).unwrap(), "<nil>");
    assert_eq!(render("{{toString .missing}}", &doc! {}).unwrap(), "<nil>");
    assert_eq!(render("{{toString .n}}", &doc! { "n": null }).unwrap(), "<nil>");
}

#[test]
fn test_sample_config_templates_compile() {
    for cache in sample_config().caches {
        for collection in cache.collections {
            Template::compile(&collection.query).unwrap();
            for map in collection.maps {
                Template::compile(&map.name).unwrap();
                Template::compile(&map.key).unwrap();
                Template::compile(&map.value).unwrap();
            }
        }
    }
}

#[test]
fn test_sample_config_renders_records() {
    let config = sample_config();
    let schools = &config.cache("districts").unwrap().collections[0];
    let id = ObjectId::parse_str("5f1b2c3d4e5f60718293a4b5").unwrap();
    let record = doc! { "_id": id, "sis_id": "S-100", "name": "Lincoln High" };

    let by_sis = &schools.maps[0];
    assert_eq!(render(&by_sis.key, &record).unwrap(), "S-100");
    assert_eq!(
        render(&by_sis.value, &record).unwrap(),
        "5f1b2c3d4e5f60718293a4b5"
    );

    let pointer = render(&by_sis.name, &params(&[("district", "d9")]).to_document()).unwrap();
    assert_eq!(pointer, "schools:d9");
}

#[test]
fn test_sample_config_query() {
    let config = sample_config();
    let schools = &config.cache("districts").unwrap().collections[0];
    let built = build_query(schools, &params(&[("district", "5f1b2c3d4e5f60718293a4b5")])).unwrap();

    let id = ObjectId::parse_str("5f1b2c3d4e5f60718293a4b5").unwrap();
    assert_eq!(built.filter, doc! { "district": id });
    assert_eq!(built.projection, Some(doc! { "name": 1_i64, "sis_id": 1_i64 }));
}

#[test]
fn test_query_with_missing_param_still_parses() {
    let config = sample_config();
    let schools = &config.cache("districts").unwrap().collections[0];
    let built = build_query(schools, &RunParameters::new()).unwrap();
    assert_eq!(built.filter, doc! { "district": "<no value>" });
}

#[test]
fn test_syntax_error_reports_location() {
    let err = Template::compile("line one\n{{ toLower .a .b }}").unwrap_err();
    match err {
        TemplateError::Syntax { line, message, .. } => {
            assert_eq!(line, 2);
            assert!(message.contains("wrong number of args"));
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_query_template_error_is_wrapped() {
    let config = sample_config();
    let mut schools = config.cache("districts").unwrap().collections[0].clone();
    schools.query = "{{ $x }}".to_string();
    let err = build_query(&schools, &RunParameters::new()).unwrap_err();
    assert!(matches!(err, QueryError::Template(TemplateError::Syntax { .. })));
}
