#[cfg(test)]
pub mod test {
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    use crate::field::{Configuration, Field};
    use crate::parse::{Parser, Registry};
    use crate::types::{Duration, Timestamp};

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct TestConfig {
        pub name: String,
        pub log_level: String,
        pub timeout: Duration,
        pub db: Option<DatabaseInfo>,
        pub owner: Option<OwnerInfo>,
    }

    impl Configuration for TestConfig {
        fn fields() -> Vec<Field> {
            vec![
                Field::leaf::<String>("name"),
                Field::leaf::<String>("log_level")
                    .short('l')
                    .description("Log level"),
                Field::leaf::<Duration>("timeout").description("Request timeout"),
                Field::optional_nested::<DatabaseInfo>("db").description("Database settings"),
                Field::optional_nested::<OwnerInfo>("owner").description("Owner settings"),
            ]
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct ServerInfo {
        pub watch: bool,
        pub ip: String,
        pub load: i32,
        pub load64: i64,
    }

    impl Configuration for ServerInfo {
        fn fields() -> Vec<Field> {
            vec![
                Field::leaf::<bool>("watch").description("Watch for changes"),
                Field::leaf::<String>("ip").description("Server address"),
                Field::leaf::<i32>("load").description("Current load"),
                Field::leaf::<i64>("load64").description("Current load, wide"),
            ]
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct DatabaseInfo {
        pub server_info: ServerInfo,
        pub connection_max: u32,
        pub connection_max64: u64,
    }

    impl Configuration for DatabaseInfo {
        fn fields() -> Vec<Field> {
            vec![
                Field::embedded::<ServerInfo>("server_info"),
                Field::leaf::<u32>("connection_max")
                    .long("comax")
                    .description("Maximum connections"),
                Field::leaf::<u64>("connection_max64").description("Maximum connections, wide"),
            ]
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct OwnerInfo {
        pub name: Option<String>,
        pub date_of_birth: Timestamp,
        pub rate: f64,
        pub servers: Vec<ServerInfo>,
    }

    impl Configuration for OwnerInfo {
        fn fields() -> Vec<Field> {
            vec![
                Field::optional::<String>("name").description("Owner name"),
                Field::leaf::<Timestamp>("date_of_birth")
                    .long("dob")
                    .description("Owner date of birth"),
                Field::leaf::<f64>("rate").description("Hourly rate"),
                Field::leaf::<Vec<ServerInfo>>("servers").description("Owned servers"),
            ]
        }
    }

    /// Every `--servers=<ip>` appends one server.
    #[derive(Debug, Clone, Default)]
    pub struct ServerListParser {
        servers: Vec<ServerInfo>,
    }

    impl Parser for ServerListParser {
        fn set(&mut self, text: &str) -> Result<(), String> {
            self.servers.push(ServerInfo {
                ip: text.to_string(),
                ..ServerInfo::default()
            });
            Ok(())
        }

        fn get(&self) -> Value {
            serde_json::to_value(&self.servers).unwrap_or(Value::Array(vec![]))
        }

        fn render(&self) -> String {
            let ips: Vec<_> = self.servers.iter().map(|s| s.ip.as_str()).collect();
            ips.join(",")
        }

        fn set_value(&mut self, value: Value) -> Result<(), String> {
            self.servers = serde_json::from_value(value).map_err(|e| e.to_string())?;
            Ok(())
        }

        fn boxed(&self) -> Box<dyn Parser> {
            Box::new(self.clone())
        }
    }

    /// Whole-value parser for `Option<String>`: `--owner.name=bob` stores
    /// `Some("BOB")`.
    #[derive(Debug, Clone, Default)]
    pub struct UpperNameParser(Option<String>);

    impl Parser for UpperNameParser {
        fn set(&mut self, text: &str) -> Result<(), String> {
            self.0 = Some(text.to_uppercase());
            Ok(())
        }

        fn get(&self) -> Value {
            serde_json::to_value(&self.0).unwrap_or(Value::Null)
        }

        fn render(&self) -> String {
            self.0.clone().unwrap_or_default()
        }

        fn set_value(&mut self, value: Value) -> Result<(), String> {
            self.0 = serde_json::from_value(value).map_err(|e| e.to_string())?;
            Ok(())
        }

        fn boxed(&self) -> Box<dyn Parser> {
            Box::new(self.clone())
        }
    }

    pub fn registry() -> Registry {
        Registry::default().with::<Vec<ServerInfo>>(ServerListParser::default())
    }

    /// Defaults used by the end-to-end load tests.
    pub fn defaults() -> TestConfig {
        TestConfig {
            name: String::new(),
            log_level: "ERROR".into(),
            timeout: Duration::from_secs(1),
            db: None,
            owner: Some(OwnerInfo {
                name: Some("owner".into()),
                rate: 0.5,
                ..OwnerInfo::default()
            }),
        }
    }

    // -- Repeated struct type -------------------------------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct Repeated {
        pub val: String,
    }

    impl Configuration for Repeated {
        fn fields() -> Vec<Field> {
            vec![Field::leaf::<String>("val").description("Value")]
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct Container {
        pub repeated: Option<Repeated>,
    }

    impl Configuration for Container {
        fn fields() -> Vec<Field> {
            vec![Field::optional_nested::<Repeated>("repeated").description("Inner repeated")]
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct RepeatedConfig {
        pub repeated: Option<Repeated>,
        pub container: Option<Container>,
    }

    impl Configuration for RepeatedConfig {
        fn fields() -> Vec<Field> {
            vec![
                Field::optional_nested::<Repeated>("repeated").description("Outer repeated"),
                Field::optional_nested::<Container>("container").description("Container"),
            ]
        }
    }

    // -- Described private field ----------------------------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct UnexportedConfig {
        pub visible: String,
        other: String,
    }

    impl Configuration for UnexportedConfig {
        fn fields() -> Vec<Field> {
            vec![
                Field::leaf::<String>("visible").description("Visible"),
                Field::leaf::<String>("other").private().description("Other"),
            ]
        }
    }

    // -- Log level with optional retries --------------------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct SubConfig {
        pub level: i64,
    }

    impl Configuration for SubConfig {
        fn fields() -> Vec<Field> {
            vec![Field::leaf::<i64>("level").description("Retry level")]
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct LevelConfig {
        pub name: String,
        pub loglevel: String,
        pub retries: Option<SubConfig>,
    }

    impl Configuration for LevelConfig {
        fn fields() -> Vec<Field> {
            vec![
                Field::leaf::<String>("name"),
                Field::leaf::<String>("loglevel").description("Log level"),
                Field::optional_nested::<SubConfig>("retries").description("Enable retries"),
            ]
        }
    }

    #[test]
    fn server_list_parser_appends() {
        let mut p = ServerListParser::default();
        p.set("10.0.0.1").unwrap();
        p.set("10.0.0.2").unwrap();
        assert_eq!(p.render(), "10.0.0.1,10.0.0.2");
        let servers: Vec<ServerInfo> = serde_json::from_value(p.get()).unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[1].ip, "10.0.0.2");
    }

    #[test]
    fn fixture_defaults_serialize() {
        let value = serde_json::to_value(defaults()).unwrap();
        let table = value.as_object().unwrap();
        assert_eq!(table.get("db"), Some(&Value::Null));
        assert!(table.get("owner").unwrap().is_object());
    }
}
