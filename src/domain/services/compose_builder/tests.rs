use super::*;
use crate::domain::entities::TemplateDocument;
use crate::domain::services::stub_parser;

fn template(id: &str, stub: &str) -> LoadedTemplate {
    LoadedTemplate::new(
        id,
        format!("/templates/{}.stub", id),
        stub_parser::parse(stub).unwrap(),
    )
}

fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn project_values() -> BTreeMap<String, String> {
    values(&[("PROJECT_NAME", "shop")])
}

const LARAVEL: &str = "\
# @section: base
app:
  build: .
  container_name: {{PROJECT_NAME}}_app
  volumes:
    - .:/var/www/html
# @section: dev
app:
  ports:
    - \"${APP_PORT:-8000}:80\"
# @section: prod
app:
  restart: always
# @section: env
APP_NAME={{PROJECT_NAME}}
";

const POSTGRES: &str = "\
# @section: base
postgres:
  image: postgres:16
  volumes:
    - postgres-data:/var/lib/postgresql/data
# @section: volumes
postgres-data:
# @section: dev
postgres:
  ports:
    - \"${DB_PORT:-5432}:5432\"
# @section: env
DB_HOST=postgres
";

const REDIS: &str = "\
# @section: base
  redis:
    image: redis:7-alpine
# @section: dev
  redis:
    ports:
      - \"${REDIS_PORT:-6379}:6379\"
";

fn laravel_postgres_redis() -> Vec<LoadedTemplate> {
    vec![
        template("laravel", LARAVEL),
        template("databases.postgres", POSTGRES),
        template("cache.redis", REDIS),
    ]
}

#[test]
fn merges_base_sections_in_selection_order() {
    let result = build(&laravel_postgres_redis(), Environment::Dev, &project_values()).unwrap();

    assert_eq!(
        result.base.service_names(),
        vec!["app", "postgres", "redis"]
    );
    assert!(result.base.volumes.contains_key("postgres-data"));
}

#[test]
fn service_count_is_one_plus_services_with_base() {
    let env_only = template("mail.relay", "# @section: env\nMAIL_HOST=relay\n");
    let mut templates = laravel_postgres_redis();
    templates.push(env_only);

    let result = build(&templates, Environment::Dev, &project_values()).unwrap();

    assert_eq!(result.base.services.len(), 1 + 2);
}

#[test]
fn build_time_tokens_are_substituted() {
    let result = build(&laravel_postgres_redis(), Environment::Dev, &project_values()).unwrap();
    let yaml = result.base.to_yaml().unwrap();

    assert!(yaml.contains("container_name: shop_app"));
    assert!(!yaml.contains("{{"));
}

#[test]
fn runtime_tokens_are_left_verbatim() {
    let result = build(&laravel_postgres_redis(), Environment::Dev, &project_values()).unwrap();
    let overlay = result.overlay.to_yaml().unwrap();

    assert!(overlay.contains("${DB_PORT:-5432}:5432"));
    assert!(overlay.contains("${REDIS_PORT:-6379}:6379"));
    assert!(overlay.contains("${APP_PORT:-8000}:80"));
}

#[test]
fn incomplete_values_raise_unresolved_placeholder() {
    let err = build(&laravel_postgres_redis(), Environment::Dev, &values(&[])).unwrap_err();

    assert_eq!(
        err,
        GenerationError::UnresolvedPlaceholder {
            names: vec!["PROJECT_NAME".to_string()],
            template: "laravel".to_string(),
            path: PathBuf::from("/templates/laravel.stub"),
        }
    );
    assert!(err.to_string().contains("{{PROJECT_NAME}}"));
}

#[test]
fn unresolved_token_in_unused_section_is_ignored() {
    let stub = "# @section: base\napp:\n  image: nginx\n# @section: prod\napp:\n  image: {{PROD_IMAGE}}\n";
    let result = build(&[template("static", stub)], Environment::Dev, &values(&[]));
    assert!(result.is_ok());
}

#[test]
fn duplicate_service_between_services_is_fatal() {
    let redis_again = template(
        "cache.redis-cluster",
        "# @section: base\nredis:\n  image: redis:7\n",
    );
    let mut templates = laravel_postgres_redis();
    templates.push(redis_again);

    let err = build(&templates, Environment::Dev, &project_values()).unwrap_err();

    assert_eq!(
        err,
        GenerationError::DuplicateService {
            service: "redis".to_string(),
            template: "cache.redis-cluster".to_string(),
            defined_by: "cache.redis".to_string(),
            path: PathBuf::from("/templates/cache.redis-cluster.stub"),
        }
    );
}

#[test]
fn duplicate_service_between_stack_and_service_is_fatal() {
    let templates = vec![
        template("laravel", LARAVEL),
        template("web.app", "# @section: base\napp:\n  image: nginx\n"),
    ];

    let err = build(&templates, Environment::Dev, &project_values()).unwrap_err();

    assert!(matches!(
        err,
        GenerationError::DuplicateService { ref service, ref defined_by, .. }
            if service == "app" && defined_by == "laravel"
    ));
}

#[test]
fn duplicate_volume_is_fatal() {
    let templates = vec![
        template("laravel", LARAVEL),
        template("databases.postgres", POSTGRES),
        template(
            "databases.timescale",
            "# @section: base\ntimescale:\n  image: timescale\n# @section: volumes\npostgres-data: {}\n",
        ),
    ];

    let err = build(&templates, Environment::Dev, &project_values()).unwrap_err();

    assert!(matches!(
        err,
        GenerationError::DuplicateVolume { ref volume, .. } if volume == "postgres-data"
    ));
}

#[test]
fn orphan_overlay_is_fatal() {
    let templates = vec![
        template("laravel", LARAVEL),
        template(
            "tools.horizon",
            "# @section: dev\nhorizon:\n  command: php artisan horizon\n",
        ),
    ];

    let err = build(&templates, Environment::Dev, &project_values()).unwrap_err();

    assert_eq!(
        err,
        GenerationError::OrphanOverlay {
            service: "horizon".to_string(),
            environment: Environment::Dev,
            template: "tools.horizon".to_string(),
            path: PathBuf::from("/templates/tools.horizon.stub"),
        }
    );
}

#[test]
fn overlay_may_patch_a_service_from_another_template() {
    let templates = vec![
        template("laravel", LARAVEL),
        template(
            "tools.xdebug",
            "# @section: dev\napp:\n  environment:\n    XDEBUG_MODE: debug\n",
        ),
    ];

    let result = build(&templates, Environment::Dev, &project_values()).unwrap();
    let app = result.overlay.services.get("app").unwrap();

    assert!(app.get("ports").is_some());
    assert!(app.get("environment").is_some());
}

#[test]
fn overlay_never_mutates_base() {
    let result = build(&laravel_postgres_redis(), Environment::Dev, &project_values()).unwrap();
    let app = result.base.services.get("app").unwrap();

    assert!(app.get("ports").is_none());
    assert!(result.base.services.get("postgres").unwrap().get("ports").is_none());
}

#[test]
fn prod_build_uses_prod_sections() {
    let result = build(&laravel_postgres_redis(), Environment::Prod, &project_values()).unwrap();

    assert_eq!(result.environment, Environment::Prod);
    assert_eq!(result.overlay.service_names(), vec!["app"]);
    let app = result.overlay.services.get("app").unwrap();
    assert_eq!(app.get("restart").and_then(Value::as_str), Some("always"));
}

#[test]
fn repeated_builds_are_byte_identical() {
    let first = build(&laravel_postgres_redis(), Environment::Dev, &project_values()).unwrap();
    let second = build(&laravel_postgres_redis(), Environment::Dev, &project_values()).unwrap();

    assert_eq!(first.base.to_yaml().unwrap(), second.base.to_yaml().unwrap());
    assert_eq!(
        first.overlay.to_yaml().unwrap(),
        second.overlay.to_yaml().unwrap()
    );
}

#[test]
fn legacy_full_document_stub() {
    let legacy = "services:\n  mailpit:\n    image: axllent/mailpit\nvolumes:\n  mail-data: {}\n";
    let templates = vec![template("laravel", LARAVEL), template("mail.mailpit", legacy)];

    let result = build(&templates, Environment::Dev, &project_values()).unwrap();

    assert_eq!(result.base.service_names(), vec!["app", "mailpit"]);
    assert!(result.base.volumes.contains_key("mail-data"));
}

#[test]
fn declared_volumes_are_added_once() {
    let redis = template("cache.redis", REDIS).with_declared_volumes(vec!["redis-data".to_string()]);
    let postgres = template("databases.postgres", POSTGRES)
        .with_declared_volumes(vec!["postgres-data".to_string()]);
    let templates = vec![template("laravel", LARAVEL), postgres, redis];

    let result = build(&templates, Environment::Dev, &project_values()).unwrap();

    assert_eq!(result.base.volumes.len(), 2);
    assert_eq!(result.base.volumes.get("redis-data"), Some(&Value::Null));
}

#[test]
fn non_mapping_section_is_invalid() {
    let templates = vec![template("broken", "# @section: base\n- app\n- db\n")];

    let err = build(&templates, Environment::Dev, &values(&[])).unwrap_err();

    assert!(matches!(err, GenerationError::InvalidFragment { ref section, .. } if section == "base"));
}

#[test]
fn identical_networks_are_shared_conflicting_are_not() {
    let a = "services:\n  a:\n    image: a\nnetworks:\n  backend:\n    driver: bridge\n";
    let b_same = "services:\n  b:\n    image: b\nnetworks:\n  backend:\n    driver: bridge\n";
    let b_other = "services:\n  b:\n    image: b\nnetworks:\n  backend:\n    driver: overlay\n";

    let ok = build(
        &[template("a", a), template("b", b_same)],
        Environment::Dev,
        &values(&[]),
    )
    .unwrap();
    assert_eq!(ok.base.networks.len(), 1);

    let err = build(
        &[template("a", a), template("b", b_other)],
        Environment::Dev,
        &values(&[]),
    )
    .unwrap_err();
    assert!(matches!(err, GenerationError::ConflictingNetwork { .. }));
}

#[test]
fn empty_document_produces_no_services() {
    let empty = LoadedTemplate::new("empty", "/templates/empty.stub", TemplateDocument::new());
    let result = build(&[empty], Environment::Dev, &values(&[])).unwrap();
    assert!(result.base.services.is_empty());
    assert!(result.overlay.services.is_empty());
}

#[test]
fn indented_sections_are_dedented() {
    let nginx = template(
        "web.nginx",
        "# @section: base\n  web:\n    image: nginx\n\u{3000}\n",
    );

    let result = build(&[nginx], Environment::Dev, &project_values()).unwrap();

    assert_eq!(result.base.service_names(), vec!["web"]);
}

#[test]
fn dedent_counts_wide_whitespace_as_one_char() {
    assert_eq!(dedent("  a:\n    b: 1\n\u{3000}"), "a:\n  b: 1\n");
    assert_eq!(dedent("\u{3000}a: 1\n\u{3000}\u{3000}b: 2"), "a: 1\n\u{3000}b: 2");
}
