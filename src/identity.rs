//! Identity resolution backed by configured profiles.

use std::collections::HashMap;

use crate::config::Profile;
use crate::store::IdentityResolver;

/// Profile directory built from settings.
#[derive(Debug, Default, Clone)]
pub struct ConfiguredIdentities {
    emails_by_profile: HashMap<String, Vec<String>>,
    login_by_email: HashMap<String, String>,
    name_by_login: HashMap<String, String>,
    avatar_by_login: HashMap<String, String>,
}

impl ConfiguredIdentities {
    /// Indexes profiles. Emails are matched case-insensitively.
    pub fn from_profiles(profiles: &[Profile]) -> Self {
        let mut identities = Self::default();

        for profile in profiles {
            let emails: Vec<String> = profile.emails.iter().map(|e| e.to_lowercase()).collect();

            if let Some(login) = &profile.login {
                for email in &emails {
                    identities
                        .login_by_email
                        .insert(email.clone(), login.clone());
                }
                if let Some(name) = &profile.display_name {
                    identities.name_by_login.insert(login.clone(), name.clone());
                }
                if let Some(avatar) = &profile.avatar_url {
                    identities
                        .avatar_by_login
                        .insert(login.clone(), avatar.clone());
                }
            }

            identities
                .emails_by_profile
                .insert(profile.id.clone(), emails);
        }

        identities
    }
}

impl IdentityResolver for ConfiguredIdentities {
    fn emails_for_profile(&self, profile_id: &str) -> Vec<String> {
        self.emails_by_profile
            .get(profile_id)
            .cloned()
            .unwrap_or_default()
    }

    fn login_for_email(&self, email: &str) -> Option<String> {
        self.login_by_email.get(&email.to_lowercase()).cloned()
    }

    fn display_name(&self, login: &str) -> Option<String> {
        self.name_by_login.get(login).cloned()
    }

    fn avatar_url(&self, login: &str) -> Option<String> {
        self.avatar_by_login.get(login).cloned()
    }
}
