//! Test error messages: their reasons, codes and the location they point to.
use insta::assert_snapshot;
use qtsql::metadata::{MappingStore, PropertyMapping, Scope, TableMapping};
use qtsql::ErrorMessage;

use super::schema;
use super::sql::compile;

fn compile_error(query: &str) -> ErrorMessage {
    let mut errors = compile(query).unwrap_err().inner;
    assert_eq!(errors.len(), 1, "{errors:?}");
    errors.remove(0)
}

/// `code reason @ start-end`, with positions as `line:column`.
fn summary(e: &ErrorMessage) -> String {
    let location = e
        .location
        .as_ref()
        .map(|l| {
            format!(
                " @ {}:{}-{}:{}",
                l.start.0, l.start.1, l.end.0, l.end.1
            )
        })
        .unwrap_or_default();
    format!(
        "{} {}{}",
        e.code.as_deref().unwrap_or("-"),
        e.reason,
        location
    )
}

#[test]
fn test_path_errors() {
    assert_snapshot!(summary(&compile_error(
        "ВЫБРАТЬ b.Код ИЗ Справочник.Контрагенты КАК a"
    )), @"E0002 can't find query table by alias `b` in `b.Код` @ 0:8-0:13");

    assert_snapshot!(summary(&compile_error(
        "ВЫБРАТЬ ПРЕДСТАВЛЕНИЕ(Код) ИЗ Справочник.Контрагенты КАК a"
    )), @"E0003 property path requires an alias, found `Код` @ 0:8-0:26");

    assert_snapshot!(summary(&compile_error(
        "ВЫБРАТЬ СУММА(a.Код) ИЗ Справочник.Контрагенты КАК a"
    )), @"E0004 unexpected function `СУММА` for `a.Код` @ 0:8-0:20");

    assert_snapshot!(summary(&compile_error(
        "ВЫБРАТЬ a.Адрес.Индекс ИЗ Справочник.Контрагенты КАК a"
    )), @"E0006 no table mapping for property `Адрес` in `a.Адрес.Индекс` @ 0:8-0:22");

    assert_snapshot!(summary(&compile_error(
        "ВЫБРАТЬ a.Владелец.Телефон ИЗ Справочник.Контрагенты КАК a"
    )), @"E0009 table `Справочник.Организации` has no property `Телефон`, in `a.Владелец.Телефон` @ 0:8-0:26");
}

#[test]
fn test_representation_of_terminal_property() {
    // the function reads the entity a property references, so the property
    // itself has to reference a table
    assert_snapshot!(summary(&compile_error(
        "ВЫБРАТЬ ПРЕДСТАВЛЕНИЕ(a.Владелец.Наименование) ИЗ Справочник.Контрагенты КАК a"
    )), @"E0006 no table mapping for property `Наименование` in `a.Владелец.Наименование` @ 0:8-0:46");
}

#[test]
fn test_function_scope() {
    let e = compile_error(
        "ВЫБРАТЬ ПРЕДСТАВЛЕНИЕ(у.Ссылка) ИЗ Документ.ПоступлениеТоваровУслуг.Услуги КАК у",
    );
    assert_snapshot!(summary(&e), @"E0005 function `ПРЕДСТАВЛЕНИЕ` not supported for scope `document` in `у.Ссылка`, it is only supported for `enumeration` and `catalog` @ 0:8-0:31");
}

#[test]
fn test_source_errors() {
    assert_snapshot!(summary(&compile_error(
        "ВЫБРАТЬ * ИЗ Справочник.Склады КАК a"
    )), @"E0008 table `Справочник.Склады` not found @ 0:10-0:36");

    assert_snapshot!(summary(&compile_error(
        "ВЫБРАТЬ *\nИЗ Справочник.Контрагенты КАК a\nleft join Справочник.Организации КАК a on a.Владелец = a.Ссылка"
    )), @"E0007 alias `a` is already used by another source @ 2:5-2:38");
}

#[test]
fn test_missing_nested_table() {
    let store = MappingStore::new([TableMapping::new(
        "Справочник.Контрагенты",
        "_Reference112",
        Scope::Catalog,
    )
    .with_property(
        PropertyMapping::new("Банк", "_Fld2070RRef").with_nested_table("Справочник.Банки"),
    )])
    .unwrap();

    let e = qtsql::compile(
        "ВЫБРАТЬ a.Банк.Наименование ИЗ Справочник.Контрагенты КАК a",
        &store,
        &qtsql::Options::default(),
    )
    .unwrap_err()
    .inner
    .remove(0);

    assert_snapshot!(summary(&e), @"E0008 table `Справочник.Банки` not found @ 0:8-0:27");
    assert_eq!(e.hints, vec!["referenced by `a.Банк.Наименование`"]);
}

#[test]
fn test_lexer_errors() {
    let e = compile_error("ВЫБРАТЬ a.Код ИЗ Справочник.Контрагенты КАК a ГДЕ a.Код = #1");
    assert_snapshot!(summary(&e), @"- unexpected `#` @ 0:58-0:59");
}

#[test]
fn test_display() {
    let e = compile_error("ВЫБРАТЬ b.Код ИЗ Справочник.Контрагенты КАК a");
    let display = e.display.clone().unwrap();

    assert!(display.contains("E0002"));
    assert!(display.contains("ВЫБРАТЬ b.Код ИЗ Справочник.Контрагенты КАК a"));
    assert!(display.contains("can't find query table by alias `b` in `b.Код`"));
    // plain display has no escape codes, nor trailing spaces
    assert!(!display.contains('\u{1b}'));
    assert!(!e.to_string().lines().any(|l| l.ends_with(' ')));
}

#[test]
fn test_without_source() {
    // errors of an already parsed query can't be annotated
    let pr = qtsql::query_to_pr("ВЫБРАТЬ b.Код ИЗ Справочник.Контрагенты КАК a").unwrap();
    let errors = qtsql::pr_to_sql(pr, schema(), &qtsql::Options::default()).unwrap_err();

    assert_snapshot!(errors.to_string(), @"[E0002] Error: can't find query table by alias `b` in `b.Код`");
    assert!(errors.inner[0].display.is_none());

    let json = errors.to_json().unwrap();
    assert!(json.contains(r#""code":"E0002""#));
    assert!(json.contains(r#""span":"8-13""#));
}
