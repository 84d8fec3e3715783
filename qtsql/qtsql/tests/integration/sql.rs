//! Simple tests for "this query text creates this SQL" go here.
use insta::assert_snapshot;
use qtsql::{ErrorMessages, Options};
use rstest::rstest;

use super::schema;

pub(crate) fn compile(query: &str) -> Result<String, ErrorMessages> {
    qtsql::compile(
        query,
        schema(),
        &Options::default().with_display(qtsql::DisplayOptions::Plain),
    )
}

#[test]
fn test_bare_tables() {
    let query = "ВЫБРАТЬ src.Код, src.Наименование\nИЗ Справочник.Контрагенты КАК src\nГДЕ src.ПометкаУдаления = ЛОЖЬ ИЛИ src.Код = \"0001\"\n";
    similar_asserts::assert_eq!(
        compile(query).unwrap(),
        "select src._Code, src._Description\nfrom _Reference112 as src\nwhere src._Marked = ЛОЖЬ or src._Code = '0001'\n"
    );

    assert_snapshot!(compile(
        "ВЫБРАТЬ * ИЗ РегистрСведений.КурсыВалют КАК р ГДЕ р.Курс > 1.5"
    ).unwrap(), @"select * from _InfoRg500 as р where р._Fld501 > 1.5");
}

#[rstest]
#[case::native("ВЫБРАТЬ a.Код КАК Код ИЗ Справочник.Контрагенты КАК a ГДЕ a.Код = 1 И a.ИНН = 2 ИЛИ a.ИНН = 3")]
#[case::lowercase("выбрать a.Код как Код из Справочник.Контрагенты как a где a.Код = 1 и a.ИНН = 2 или a.ИНН = 3")]
#[case::english("SELECT a.Код AS Код FROM Справочник.Контрагенты AS a WHERE a.Код = 1 AND a.ИНН = 2 OR a.ИНН = 3")]
fn test_keywords(#[case] query: &str) {
    similar_asserts::assert_eq!(
        compile(query).unwrap(),
        "select a._Code as Код from _Reference112 as a where a._Code = 1 and a._Fld2040 = 2 or a._Fld2040 = 3"
    );
}

#[test]
fn test_untranslated_tokens_pass_through() {
    assert_snapshot!(compile(
        "ВЫБРАТЬ ПЕРВЫЕ 5 src.Ссылка ИЗ Справочник.Контрагенты КАК src УПОРЯДОЧИТЬ ПО src.Код УБЫВ"
    ).unwrap(), @"select ПЕРВЫЕ 5 src._IDRRef from _Reference112 as src УПОРЯДОЧИТЬ ПО src._Code УБЫВ");
}

#[test]
fn test_keyword_inside_names() {
    // `Из` inside an identifier, or as a path segment, isn't a keyword
    let store = qtsql::metadata::MappingStore::new([qtsql::metadata::TableMapping::new(
        "Справочник.Изделия",
        "_Reference7",
        qtsql::metadata::Scope::Catalog,
    )
    .with_property(qtsql::metadata::PropertyMapping::new("Из", "_Fld70"))])
    .unwrap();

    assert_snapshot!(qtsql::compile(
        "ВЫБРАТЬ изд.Из ИЗ Справочник.Изделия КАК изд",
        &store,
        &Options::default()
    ).unwrap(), @"select изд._Fld70 from _Reference7 as изд");
}

#[test]
fn test_nested_path() {
    assert_snapshot!(compile(
        "ВЫБРАТЬ a.Владелец.Наименование ИЗ Справочник.Контрагенты КАК a"
    ).unwrap(), @"select a.__nested_field0 from (select __nested_table0._Description as __nested_field0 from _Reference112 as __nested_main_table left join _Reference90 as __nested_table0 on __nested_table0._IDRRef = __nested_main_table._OwnerIDRRef) as a");
}

#[test]
fn test_representation_of_catalog() {
    // the owner's name is read through a join to the owner's table, same as
    // for an explicit path to it
    similar_asserts::assert_eq!(
        compile("ВЫБРАТЬ ПРЕДСТАВЛЕНИЕ(a.Владелец) ИЗ Справочник.Контрагенты КАК a").unwrap(),
        compile("ВЫБРАТЬ a.Владелец.Наименование ИЗ Справочник.Контрагенты КАК a").unwrap(),
    );
}

#[test]
fn test_representation_of_enumeration() {
    assert_snapshot!(compile(
        "ВЫБРАТЬ REPRESENTATION(a.ВидКонтрагента) ИЗ Справочник.Контрагенты КАК a"
    ).unwrap(), @"select a.__nested_field0 from (select __nested_table1.enumValueName as __nested_field0 from _Reference112 as __nested_main_table left join _Enum37 as __nested_table0 on __nested_table0._IDRRef = __nested_main_table._Fld2041RRef left join simple1c__enumMappings as __nested_table1 on __nested_table1.enumName = 'ВидыКонтрагентов' and __nested_table1.orderIndex = __nested_table0._EnumOrder) as a");
}

#[test]
fn test_mixed_paths() {
    assert_snapshot!(compile(r#"ВЫБРАТЬ a.Наименование, a.Владелец.Наименование, a.Владелец.ИНН, ПРЕДСТАВЛЕНИЕ(a.ВидКонтрагента) ИЗ Справочник.Контрагенты КАК a ГДЕ a.ИНН = &p0 И a.Владелец.Наименование <> "ООО ""Ромашка""""#).unwrap(),
        @r#"select a._Description, a.__nested_field0, a.__nested_field1, a.__nested_field2 from (select __nested_main_table._Description, __nested_table0._Description as __nested_field0, __nested_table0._Fld1500 as __nested_field1, __nested_table2.enumValueName as __nested_field2, __nested_main_table._Fld2040 from _Reference112 as __nested_main_table left join _Reference90 as __nested_table0 on __nested_table0._IDRRef = __nested_main_table._OwnerIDRRef left join _Enum37 as __nested_table1 on __nested_table1._IDRRef = __nested_main_table._Fld2041RRef left join simple1c__enumMappings as __nested_table2 on __nested_table2.enumName = 'ВидыКонтрагентов' and __nested_table2.orderIndex = __nested_table1._EnumOrder) as a where a._Fld2040 = &p0 and a.__nested_field0 <> 'ООО "Ромашка"'"#);
}

#[test]
fn test_memoized_paths() {
    let sql = compile(
        "ВЫБРАТЬ a.Владелец.Наименование, a.ВЛАДЕЛЕЦ.наименование ИЗ Справочник.Контрагенты КАК a ГДЕ a.Владелец.Наименование <> \"\"",
    )
    .unwrap();

    assert!(sql.starts_with("select a.__nested_field0, a.__nested_field0 from"));
    assert!(sql.ends_with("where a.__nested_field0 <> ''"));
    assert_eq!(sql.matches("left join").count(), 1);
    assert!(!sql.contains("__nested_field1"));
}

#[test]
fn test_deep_path() {
    // a contract's kind, through the contract, from the document
    assert_snapshot!(compile(
        "ВЫБРАТЬ д.Номер, д.ДоговорКонтрагента.ВидДоговора.Порядок ИЗ Документ.ПоступлениеТоваровУслуг КАК д"
    ).unwrap(), @"select д._Number, д.__nested_field0 from (select __nested_main_table._Number, __nested_table2.enumValueName as __nested_field0 from _Document180 as __nested_main_table left join _Reference95 as __nested_table0 on __nested_table0._IDRRef = __nested_main_table._Fld3011RRef left join _Enum40 as __nested_table1 on __nested_table1._IDRRef = __nested_table0._Fld1800RRef left join simple1c__enumMappings as __nested_table2 on __nested_table2.enumName = 'ВидыДоговоров' and __nested_table2.orderIndex = __nested_table1._EnumOrder) as д");
}

#[test]
fn test_self_reference() {
    // the same table joined to itself gets its own alias
    assert_snapshot!(compile(
        "ВЫБРАТЬ a.ГоловнойКонтрагент.Наименование ИЗ Справочник.Контрагенты КАК a"
    ).unwrap(), @"select a.__nested_field0 from (select __nested_table0._Description as __nested_field0 from _Reference112 as __nested_main_table left join _Reference112 as __nested_table0 on __nested_table0._IDRRef = __nested_main_table._Fld2050RRef) as a");
}

#[test]
fn test_join_sources() {
    assert_snapshot!(compile(
        "ВЫБРАТЬ д.Номер, к.Владелец.Наименование ИЗ Документ.ПоступлениеТоваровУслуг КАК д left join Справочник.Контрагенты КАК к on д.Контрагент = к.Ссылка"
    ).unwrap(), @"select д._Number, к.__nested_field0 from _Document180 as д left join (select __nested_table0._Description as __nested_field0, __nested_main_table._IDRRef from _Reference112 as __nested_main_table left join _Reference90 as __nested_table0 on __nested_table0._IDRRef = __nested_main_table._OwnerIDRRef) as к on д._Fld3010RRef = к._IDRRef");
}

#[test]
fn test_table_section() {
    assert_snapshot!(compile(
        "ВЫБРАТЬ src.Содержание, src.Ссылка.Номер ИЗ Документ.ПоступлениеТоваровУслуг.Услуги КАК src"
    ).unwrap(), @"select src._Fld3022, src.__nested_field0 from (select __nested_main_table._Fld3022, __nested_table0._Number as __nested_field0 from _Document180_VT3020 as __nested_main_table left join _Document180 as __nested_table0 on __nested_table0._IDRRef = __nested_main_table._Document180_IDRRef) as src");
}

#[test]
fn test_compilations_are_independent() {
    let query = "ВЫБРАТЬ a.Владелец.ИНН ИЗ Справочник.Контрагенты КАК a";
    let first = compile(query).unwrap();
    let second = compile(query).unwrap();

    similar_asserts::assert_eq!(first, second);
    assert!(second.contains("__nested_table0"));
    assert!(!second.contains("__nested_table1"));
}

#[test]
fn test_concurrent_compilations() {
    let query = "ВЫБРАТЬ ПРЕДСТАВЛЕНИЕ(a.ВидКонтрагента), a.Владелец.ИНН, a.ОсновнойДоговор.Наименование ИЗ Справочник.Контрагенты КАК a";
    let expected = compile(query).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(move || compile(query).unwrap()))
        .collect();

    for handle in handles {
        similar_asserts::assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_format() {
    let sql = qtsql::compile(
        "ВЫБРАТЬ src.Код ИЗ Справочник.Контрагенты КАК src ГДЕ src.Код = \"1\"",
        schema(),
        &Options::default().with_format(true),
    )
    .unwrap();

    assert!(sql.lines().count() > 1);
    assert!(sql.contains("src._Code = '1'"));
}
