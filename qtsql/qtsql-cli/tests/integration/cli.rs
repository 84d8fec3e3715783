use std::fs;
use std::path::PathBuf;
use std::process::Command;

use insta_cmd::assert_cmd_snapshot;
use insta_cmd::get_cargo_bin;

#[test]
fn compile() {
    assert_cmd_snapshot!(qtsql_command()
        .args(["compile", "--schema"])
        .arg(schema_path())
        .pass_stdin("ВЫБРАТЬ a.ИНН ИЗ Справочник.Контрагенты КАК a ГДЕ a.ПометкаУдаления = ЛОЖЬ"), @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    select a._Fld2040 from _Reference112 as a where a._Marked = ЛОЖЬ

    ----- stderr -----
    "###);
}

#[test]
fn compile_schema_from_env() {
    assert_cmd_snapshot!(qtsql_command()
        .arg("compile")
        .env("QTSQL_SCHEMA", schema_path())
        .pass_stdin("ВЫБРАТЬ ПРЕДСТАВЛЕНИЕ(a.Владелец) ИЗ Справочник.Контрагенты КАК a"), @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    select a.__nested_field0 from (select __nested_table0._Description as __nested_field0 from _Reference112 as __nested_main_table left join _Reference90 as __nested_table0 on __nested_table0._IDRRef = __nested_main_table._OwnerIDRRef) as a

    ----- stderr -----
    "###);
}

#[test]
fn compile_without_schema() {
    assert_cmd_snapshot!(qtsql_command()
        .arg("compile")
        .pass_stdin("ВЫБРАТЬ * ИЗ Справочник.Контрагенты КАК a"), @r###"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    `compile` needs table metadata; pass `--schema` or set `QTSQL_SCHEMA`
    "###);
}

#[test]
fn compile_error() {
    let output = qtsql_command()
        .args(["compile", "--schema"])
        .arg(schema_path())
        .arg("-")
        .pass_stdin_bytes("ВЫБРАТЬ a.Склад ИЗ Справочник.Контрагенты КАК a");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("[E0009] Error"), "{stderr}");
    assert!(stderr.contains("has no property `Склад`"), "{stderr}");
    // colors are disabled
    assert!(!stderr.contains('\u{1b}'), "{stderr}");
}

#[test]
fn list_scopes() {
    assert_cmd_snapshot!(qtsql_command().arg("list-scopes"), @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    catalog (Справочник)
    document (Документ)
    enumeration (Перечисление)
    information_register (РегистрСведений)
    accumulation_register (РегистрНакопления)
    accounting_register (РегистрБухгалтерии)
    chart_of_accounts (ПланСчетов)
    chart_of_characteristic_types (ПланВидовХарактеристик)
    table_section

    ----- stderr -----
    "###);
}

#[test]
fn build_and_compile() {
    assert_cmd_snapshot!(qtsql_command()
        .args(["build", "--format", "json", "--schema"])
        .arg(schema_path())
        .pass_stdin(r#"
source: Справочник.Контрагенты
projection: [src.Наименование]
parameters:
  - integer: 1
where:
  - src.Код = &p0
"#), @r###"
    success: true
    exit_code: 0
    ----- stdout -----
    {
      "sql": "select src._Description from _Reference112 as src where src._Code = &p0",
      "parameters": [
        [
          "p0",
          {
            "integer": 1
          }
        ]
      ]
    }
    ----- stderr -----
    "###);
}

#[test]
fn debug_log() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("debug.json");

    let output = qtsql_command()
        .args(["compile", "--schema"])
        .arg(schema_path())
        .arg("--debug-log")
        .arg(&log_path)
        .pass_stdin_bytes("ВЫБРАТЬ a.Владелец.ИНН ИЗ Справочник.Контрагенты КАК a");
    assert!(output.status.success());

    let log: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&log_path).unwrap()).unwrap();

    let kinds: Vec<String> = log["entries"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|entry| entry["kind"].as_object())
        .filter_map(|kind| kind.keys().next().cloned())
        .collect();

    assert!(kinds.contains(&"ReprQuery".to_string()), "{kinds:?}");
    assert!(kinds.contains(&"ReprPr".to_string()), "{kinds:?}");
    assert!(kinds.contains(&"ReprGraph".to_string()), "{kinds:?}");
    assert_eq!(kinds.last().map(String::as_str), Some("ReprSql"));
}

#[test]
fn debug_log_unknown_format() {
    let output = qtsql_command()
        .args(["compile", "--schema"])
        .arg(schema_path())
        .args(["--debug-log", "debug.html"])
        .pass_stdin_bytes("ВЫБРАТЬ * ИЗ Справочник.Контрагенты КАК a");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown debug log format"), "{stderr}");
}

fn schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../qtsql/tests/integration/data/schema.yaml")
}

fn qtsql_command() -> Command {
    let mut cmd = Command::new(get_cargo_bin("qtsql"));
    normalize_qtsql(&mut cmd);
    cmd
}

fn normalize_qtsql(cmd: &mut Command) -> &mut Command {
    cmd
        // `CLICOLOR_FORCE` overrides the `--color=never` flag.
        .env_remove("CLICOLOR_FORCE")
        .env("NO_COLOR", "1")
        .args(["--color=never"])
        .env_remove("RUST_BACKTRACE")
        .env_remove("RUST_LOG")
        .env_remove("QTSQL_SCHEMA")
        .env_remove("QTSQL_DEBUG_LOG")
}

/// Runs the command with `input` on stdin and collects its output.
trait PassStdinBytes {
    fn pass_stdin_bytes(&mut self, input: &str) -> std::process::Output;
}

impl PassStdinBytes for Command {
    fn pass_stdin_bytes(&mut self, input: &str) -> std::process::Output {
        use std::io::Write;
        use std::process::Stdio;

        let mut child = self
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
        child.wait_with_output().unwrap()
    }
}
