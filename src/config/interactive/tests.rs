use super::*;

#[test]
fn base_url_validation() {
    assert!(validate_base_url("https://api.openai.com/v1").is_ok());
    assert!(validate_base_url("http://localhost:11434/v1").is_ok());
    assert!(validate_base_url("not a url").is_err());
}

#[test]
fn llm_setters_applied_in_order() {
    let mut llm = LlmConfig::default();
    configure_defaults(&mut llm);

    assert_eq!(llm.base_url, "http://localhost:8080/v1");
    assert_eq!(llm.model, "local-model");
    assert_eq!(llm.api_key_env, "LOCAL_API_KEY");
}

fn configure_defaults(llm: &mut LlmConfig) {
    llm.set_base_url("http://localhost:8080/v1".to_string())
        .expect("valid url");
    llm.set_model("local-model".to_string()).expect("valid model");
    llm.set_api_key_env("LOCAL_API_KEY".to_string())
        .expect("valid env name");
}
