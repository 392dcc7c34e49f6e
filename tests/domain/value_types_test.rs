use bomatic::domain::{AiProvider, AudioFormat, JobId, StoragePath, TemplateType};

#[test]
fn given_job_and_filename_when_building_upload_path_then_namespaced_by_job() {
    let id = JobId::new();

    let path = StoragePath::for_upload(&id, "session 1.wav");

    assert_eq!(path.as_str(), format!("batch/{}/session 1.wav", id.as_uuid()));
    assert_eq!(path.to_string(), path.as_str());
}

#[test]
fn given_provider_aliases_when_parsing_then_resolves_provider() {
    assert_eq!("OpenAI".parse::<AiProvider>().unwrap(), AiProvider::OpenAi);
    assert_eq!("gpt".parse::<AiProvider>().unwrap(), AiProvider::OpenAi);
    assert_eq!(" gemini ".parse::<AiProvider>().unwrap(), AiProvider::Gemini);
    assert!("claude".parse::<AiProvider>().is_err());
}

#[test]
fn given_template_type_strings_when_parsing_then_raw_and_refined_accepted() {
    assert_eq!("RAW".parse::<TemplateType>().unwrap(), TemplateType::Raw);
    assert_eq!("refined".parse::<TemplateType>().unwrap(), TemplateType::Refined);
    assert_eq!(TemplateType::default(), TemplateType::Refined);
    assert!("fancy".parse::<TemplateType>().is_err());
}

#[test]
fn given_audio_filenames_when_detecting_format_then_extension_decides() {
    assert_eq!(AudioFormat::from_filename("a.WAV"), Some(AudioFormat::Wav));
    assert_eq!(AudioFormat::from_filename("b.m4a"), Some(AudioFormat::M4a));
    assert_eq!(AudioFormat::from_filename("notes.txt"), None);
    assert_eq!(AudioFormat::from_filename("noextension"), None);
    assert_eq!(AudioFormat::Mp3.as_mime(), "audio/mpeg");
}

#[test]
fn given_serialized_provider_when_deserializing_then_lowercase_names_used() {
    let json = serde_json::to_string(&AiProvider::OpenAi).unwrap();
    assert_eq!(json, "\"openai\"");

    let parsed: AiProvider = serde_json::from_str("\"gemini\"").unwrap();
    assert_eq!(parsed, AiProvider::Gemini);
}
