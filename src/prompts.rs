// prompts.rs

pub fn severity_prompt(title: &str, description: &str) -> String {
    format!(
        "You are a cybersecurity expert. Analyze the following cybersecurity news article and
classify its severity level based on industry standards.

Article Title: {}
Article Description: {}

Classification criteria:
- HIGH: Critical vulnerabilities, active exploits, widespread attacks, data breaches affecting
many users, zero-day vulnerabilities, ransomware campaigns, nation-state attacks
- MEDIUM: Important security updates, newly discovered vulnerabilities (not yet exploited),
significant security incidents, emerging threats, security tool releases
- LOW: General security news, minor updates, educational content, security tips, company
announcements, minor patches

Provide your response in the following JSON format only (no additional text):
{{
    \"severity\": \"HIGH\" or \"MEDIUM\" or \"LOW\",
    \"reasoning\": \"Brief explanation (max 100 characters) why this classification was chosen\"
}}",
        title, description
    )
}
