//! Prompt construction
//!
//! Prompts are a pure function of the request parameters, so identical
//! requests always send identical text.

use crate::models::{ActivityDuration, RequestParameters, SUGGESTION_COUNT, Situation};

fn situation_label(situation: Situation) -> &'static str {
    match situation {
        Situation::Workplace => "at work, at or near their desk",
        Situation::Home => "at home",
        Situation::Outside => "outside, on the move or in a public place",
        Situation::JobHunting => "in the middle of a job search",
    }
}

fn audience_label(age_group: &str) -> &'static str {
    match age_group {
        "student" => "high school and university students",
        "middle_school" => "middle school students aged 13 to 15",
        "housewife" => "people running a household",
        "elderly" | "senior" => "older adults aged 65 and over",
        "job_hunting" => "people looking for work or changing careers",
        _ => "working adults in their 20s to 40s",
    }
}

fn pace_hint(duration: ActivityDuration) -> &'static str {
    match duration {
        ActivityDuration::Five => "something that fits into a short pause and needs no preparation",
        ActivityDuration::Fifteen => "a short, self-contained activity with a clear ending",
        ActivityDuration::Thirty => "a longer activity that can take a few steps",
    }
}

const RESPONSE_FORMAT: &str = r#"Respond with a JSON array only, no other text:
[
  {
    "title": "short title",
    "description": "one or two sentences on what to do and why it helps",
    "category": "cognitive" or "behavioral",
    "steps": ["step 1", "step 2", "step 3"]
  }
]"#;

/// Build the prompt for a request. The job-hunting persona, chosen by
/// situation or age group, gets its own template and ignores the situation.
pub fn build_prompt(params: &RequestParameters) -> String {
    if params.is_job_hunting() {
        job_hunting_prompt(params)
    } else {
        general_prompt(params)
    }
}

fn general_prompt(params: &RequestParameters) -> String {
    format!(
        "You suggest short restorative breaks that help people reset their mood.\n\
         \n\
         Context:\n\
         - Audience: {audience}\n\
         - Where they are: {situation}\n\
         - Time available: {minutes} minutes ({pace})\n\
         \n\
         Suggest exactly {count} activities that can realistically be done in that place \
         within that time. Mix cognitive activities (reframing, reflection, focused \
         attention) with behavioral ones (movement, breathing, changing surroundings). \
         Keep each one concrete and safe.\n\
         \n\
         {format}",
        audience = audience_label(&params.age_group),
        situation = situation_label(params.situation),
        minutes = params.duration.minutes(),
        pace = pace_hint(params.duration),
        count = SUGGESTION_COUNT,
        format = RESPONSE_FORMAT,
    )
}

fn job_hunting_prompt(params: &RequestParameters) -> String {
    format!(
        "You support people through the stress of looking for work.\n\
         \n\
         Context:\n\
         - Audience: {audience}\n\
         - Time available: {minutes} minutes ({pace})\n\
         \n\
         Suggest exactly {count} activities that relieve job-search pressure: recovering \
         from rejection, calming nerves before an interview, restoring confidence, or \
         stepping away from applications for a moment. At least one should be behavioral. \
         Do not suggest doing more applications.\n\
         \n\
         {format}",
        audience = audience_label(&params.age_group),
        minutes = params.duration.minutes(),
        pace = pace_hint(params.duration),
        count = SUGGESTION_COUNT,
        format = RESPONSE_FORMAT,
    )
}
