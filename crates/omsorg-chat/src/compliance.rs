//! Localized compliance text and the system preamble builder.
//!
//! The texts are fixed per language and reviewed by the hospital's legal
//! team; nothing here is computed at runtime beyond string assembly, so the
//! preamble for a given language is always byte-identical.

use omsorg_core::messages::Language;

/// Substituted verbatim when the gateway returns a completion with no
/// usable text. Deliberately not localized.
pub const FALLBACK_REPLY: &str =
    "I apologize, but I couldn't generate a response. Please try again.";

/// The per-language compliance text table.
#[derive(Clone, Copy, Debug)]
pub struct ComplianceText {
    /// Persona and guidelines for the assistant.
    pub system_prompt: &'static str,
    /// Mandatory AI-system notice, surfaced in the first reply.
    pub ai_disclosure: &'static str,
    /// Mandatory medical disclaimer, surfaced on medical topics.
    pub medical_disclaimer: &'static str,
    /// Heading shown above the consent text.
    pub consent_title: &'static str,
    /// The exact consent wording a grant stores.
    pub consent_text: &'static str,
}

const EN: ComplianceText = ComplianceText {
    system_prompt: "You are a compassionate AI assistant for cancer patients at Rigshospitalet, Copenhagen's largest public teaching hospital.\n\nYour role:\n- Provide accurate, evidence-based information about cancer care\n- Offer emotional support and understanding\n- Help patients navigate hospital services\n- Answer questions about treatments, side effects, and recovery\n- Direct patients to appropriate resources\n\nGuidelines:\n- Always be empathetic and supportive\n- Use clear, simple language\n- Acknowledge uncertainty when appropriate\n- Encourage patients to discuss concerns with their medical team\n- Never provide specific medical diagnoses or treatment recommendations\n- Respect patient privacy and dignity\n\nWhen you don't know something, say so and suggest they speak with their healthcare provider.",
    ai_disclosure: "⚠️ **AI System Notice**: You are communicating with an AI chatbot. This system is designed to provide general cancer-related information and support, but it is **not a substitute for professional medical advice, diagnosis, or treatment**.",
    medical_disclaimer: "**Medical Disclaimer**: The information provided by this chatbot is for educational purposes only. Always seek the advice of your physician or other qualified health provider with any questions you may have regarding a medical condition. Never disregard professional medical advice or delay in seeking it because of something you have read here.",
    consent_title: "Data Processing Consent",
    consent_text: "To provide you with personalized support, we need to process your health-related data. Your data will be:\n\n- Stored securely and encrypted\n- Used only to provide chatbot services\n- Retained according to hospital policies\n- Protected under GDPR and EU AI Act\n\nYou can withdraw consent at any time.",
};

const DA: ComplianceText = ComplianceText {
    system_prompt: "Du er en medfølende AI-assistent for kræftpatienter på Rigshospitalet, Københavns største offentlige undervisningshospital.\n\nDin rolle:\n- Giv nøjagtig, evidensbaseret information om kræftbehandling\n- Tilbyd følelsesmæssig støtte og forståelse\n- Hjælp patienter med at navigere i hospitalets tjenester\n- Besvar spørgsmål om behandlinger, bivirkninger og bedring\n- Henvis patienter til passende ressourcer\n\nRetningslinjer:\n- Vær altid empatisk og støttende\n- Brug klart, simpelt sprog\n- Anerkend usikkerhed når det er passende\n- Opfordr patienter til at diskutere bekymringer med deres medicinske team\n- Giv aldrig specifikke medicinske diagnoser eller behandlingsanbefalinger\n- Respekter patientens privatliv og værdighed\n\nNår du ikke ved noget, så sig det og foreslå at de taler med deres sundhedsudbyder.",
    ai_disclosure: "⚠️ **AI-system meddelelse**: Du kommunikerer med en AI-chatbot. Dette system er designet til at give generel kræftrelateret information og støtte, men det er **ikke en erstatning for professionel medicinsk rådgivning, diagnose eller behandling**.",
    medical_disclaimer: "**Medicinsk ansvarsfraskrivelse**: Informationen fra denne chatbot er kun til uddannelsesformål. Søg altid råd fra din læge eller anden kvalificeret sundhedsudbyder med spørgsmål om en medicinsk tilstand. Ignorer aldrig professionel medicinsk rådgivning eller forsinke søgning af den på grund af noget, du har læst her.",
    consent_title: "Samtykke til databehandling",
    consent_text: "For at give dig personlig støtte skal vi behandle dine sundhedsrelaterede data. Dine data vil blive:\n\n- Gemt sikkert og krypteret\n- Kun brugt til at levere chatbot-tjenester\n- Opbevaret i henhold til hospitalets politikker\n- Beskyttet under GDPR og EU AI Act\n\nDu kan til enhver tid trække dit samtykke tilbage.",
};

/// The compliance table for `language`.
#[must_use]
pub fn texts(language: Language) -> &'static ComplianceText {
    match language {
        Language::En => &EN,
        Language::Da => &DA,
    }
}

/// Build the system preamble sent as the first prompt entry of every
/// gateway call: persona prompt, the compliance directives, and the literal
/// disclosure and disclaimer strings the model must echo.
#[must_use]
pub fn build_system_preamble(language: Language) -> String {
    let t = texts(language);
    format!(
        "{system_prompt}\n\n\
         IMPORTANT COMPLIANCE REQUIREMENTS:\n\
         1. You MUST include the AI disclosure at the start of your first response\n\
         2. You MUST include the medical disclaimer when discussing any medical topics\n\
         3. Always encourage users to consult with their healthcare team for specific medical advice\n\
         4. Be empathetic, supportive, and respectful\n\
         5. Use {language_name} language\n\n\
         AI Disclosure to include in first response:\n\
         {ai_disclosure}\n\n\
         Medical Disclaimer to include when relevant:\n\
         {medical_disclaimer}",
        system_prompt = t.system_prompt,
        language_name = language.english_name(),
        ai_disclosure = t.ai_disclosure,
        medical_disclaimer = t.medical_disclaimer,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
