/// Extraction policy shared by every backend call.
pub const SYSTEM_INSTRUCTION: &str = r#"You are a high-accuracy professional intelligence agent. Extract ALL contact and career data from professional profiles with extreme precision.

EXTRACTION RULES:
1. ASSOCIATION: The "fullName" must be correctly linked to the "phoneNumbers" and "emails" you report. If a number is presented as the person's direct line, list it first.
2. MULTIPLE ENTRIES: Scour every visible section (Summary, About, Contact Info, Experience) for email addresses and phone numbers. Capture EVERY unique entry.
3. SEARCH GROUNDING: When given a URL, use the search tool to find the profile's public details. Look for "Email:", "Contact:", "Direct:", "Mobile:", the "@" symbol, and "+" followed by digits.
4. IDENTIFICATION: Name, job title and organization are mandatory when visible.
5. ZERO HALLUCINATION: If no email or phone is found, return an empty array []. Never invent data.
6. FORMAT: Return a strictly valid JSON object matching the provided schema. Report your confidence in the result as "confidenceScore" between 0 and 1."#;

/// Instruction sent alongside an uploaded screenshot.
pub const IMAGE_PROMPT: &str = "Extract all professional info from this profile screenshot. Make sure the name and the primary contact number are correctly identified and linked. Return as JSON.";

pub fn build_url_prompt(url: &str) -> String {
    let slug = profile_slug(url);

    format!(
        r#"Research this profile: {url}

Exhaustively find every listed email address and phone number for this specific person. Check the 'About' section for direct contact lines.
Link the person identified by "{slug}" directly to any contact details discovered. Only report details that belong to this individual."#
    )
}

/// Last non-empty path segment of a profile URL, e.g. `jdoe` for
/// `https://www.linkedin.com/in/jdoe/`.
pub fn profile_slug(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);

    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_slug() {
        assert_eq!(profile_slug("https://www.linkedin.com/in/jdoe"), "jdoe");
        assert_eq!(profile_slug("https://www.linkedin.com/in/jdoe/"), "jdoe");
        assert_eq!(profile_slug("https://www.linkedin.com/in/jdoe?trk=feed"), "jdoe");
        assert_eq!(profile_slug("jdoe"), "jdoe");
    }

    #[test]
    fn test_url_prompt_names_url_and_person() {
        let prompt = build_url_prompt("https://www.linkedin.com/in/jdoe");

        assert!(prompt.contains("https://www.linkedin.com/in/jdoe"));
        assert!(prompt.contains("\"jdoe\""));
        assert!(prompt.contains("email address and phone number"));
    }

    #[test]
    fn test_system_instruction_forbids_hallucination() {
        assert!(SYSTEM_INSTRUCTION.contains("ZERO HALLUCINATION"));
        assert!(SYSTEM_INSTRUCTION.contains("empty array []"));
    }
}
