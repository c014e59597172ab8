//! Role-framed mediator instructions
//!
//! The mediator sees one message at a time and must know which side of
//! the dispute it came from: the reply to the concern raiser
//! acknowledges and asks for detail, the reply to the other party
//! restates the concern and solicits their perspective. The reply is
//! delivered to the sender's counterpart, so each framing addresses
//! the recipient by name.

use crate::store::{Party, PartyNames};

/// Build the system prompt for a message sent by `speaker`.
pub fn system_prompt(speaker: Party, names: &PartyNames) -> String {
    let role_context = match speaker {
        Party::Party1 => format!(
            "You are speaking with {}, who raised the concern.",
            names.party1
        ),
        Party::Party2 => format!(
            "You are speaking with {}, who was mentioned in the concern.",
            names.party2
        ),
    };

    format!(
        "{role_context}\n\
         Listen carefully and respond based on the roles:\n\
         - For the concern raiser, acknowledge their concern and ask for more details.\n\
         - For the responder, explain the concern and ask for their perspective."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concern_raiser_framing_addresses_party1() {
        let names = PartyNames::new("Alice", "Bob");
        let prompt = system_prompt(Party::Party1, &names);

        assert!(prompt.contains("Alice"));
        assert!(!prompt.contains("Bob"));
        assert!(prompt.contains("raised the concern"));
    }

    #[test]
    fn test_responder_framing_addresses_party2() {
        let names = PartyNames::new("Alice", "Bob");
        let prompt = system_prompt(Party::Party2, &names);

        assert!(prompt.contains("Bob"));
        assert!(!prompt.contains("Alice"));
        assert!(prompt.contains("mentioned in the concern"));
    }

    #[test]
    fn test_both_framings_carry_role_instructions() {
        let names = PartyNames::new("Alice", "Bob");
        for speaker in [Party::Party1, Party::Party2] {
            let prompt = system_prompt(speaker, &names);
            assert!(prompt.contains("acknowledge their concern"));
            assert!(prompt.contains("ask for their perspective"));
        }
    }
}
