// src/ledger/identity.rs
//! Identity & profile store.

use alloy_primitives::Address;
use tracing::{info, warn};

use super::{Ledger, LedgerError, Result};
use crate::fhe::{verify_u256, verify_u32, ComputeError, ConfidentialCompute};
use crate::types::{Company, CompanyInput, Individual, IndividualInput, LedgerEvent, Tx};

impl<C: ConfidentialCompute> Ledger<C> {
    pub fn register_individual(&mut self, tx: &Tx, input: IndividualInput) -> Result<()> {
        if self.individuals.get(&tx.sender).is_some_and(|p| p.exists) {
            warn!("Rejected duplicate individual registration for {}", tx.sender);
            return Err(LedgerError::AlreadyRegistered(tx.sender));
        }

        let mut profile = self.verify_profile(tx, &input)?;
        profile.version = 1;
        self.grant_profile_to_owner(&profile, tx.sender);
        self.individuals.insert(tx.sender, profile);

        info!("Individual registered: {}", tx.sender);
        self.emit(tx, LedgerEvent::IndividualRegistered { individual: tx.sender });
        Ok(())
    }

    /// Replace all six encrypted fields at once and bump the version.
    pub fn update_individual_profile(&mut self, tx: &Tx, input: IndividualInput) -> Result<()> {
        let current_version = match self.individuals.get(&tx.sender) {
            Some(p) if p.exists => p.version,
            _ => return Err(LedgerError::IndividualNotFound(tx.sender)),
        };

        let mut profile = self.verify_profile(tx, &input)?;
        profile.version = current_version + 1;
        self.grant_profile_to_owner(&profile, tx.sender);
        let version = profile.version;
        self.individuals.insert(tx.sender, profile);

        info!("Individual {} updated profile to version {}", tx.sender, version);
        self.emit(
            tx,
            LedgerEvent::IndividualProfileUpdated {
                individual: tx.sender,
                version,
            },
        );
        Ok(())
    }

    pub fn register_company(&mut self, tx: &Tx, input: CompanyInput) -> Result<()> {
        if self.companies.get(&tx.sender).is_some_and(|c| c.exists) {
            warn!("Rejected duplicate company registration for {}", tx.sender);
            return Err(LedgerError::AlreadyRegistered(tx.sender));
        }

        let name = input.name.clone();
        self.companies.insert(tx.sender, company_from(input, tx.sender));

        info!("Company registered: {} ({})", name, tx.sender);
        self.emit(
            tx,
            LedgerEvent::CompanyRegistered {
                company: tx.sender,
                name,
            },
        );
        Ok(())
    }

    pub fn update_company_profile(&mut self, tx: &Tx, input: CompanyInput) -> Result<()> {
        match self.companies.get(&tx.sender) {
            Some(c) if c.exists => {}
            _ => return Err(LedgerError::CompanyNotFound(tx.sender)),
        }

        let name = input.name.clone();
        self.companies.insert(tx.sender, company_from(input, tx.sender));

        info!("Company {} updated profile", tx.sender);
        self.emit(
            tx,
            LedgerEvent::CompanyProfileUpdated {
                company: tx.sender,
                name,
            },
        );
        Ok(())
    }

    /// Verify every handle before anything is stored; version is set by the caller.
    fn verify_profile(&self, tx: &Tx, input: &IndividualInput) -> Result<Individual> {
        let compute = self.compute.as_ref();
        let origin = self.origin(tx);
        let att = &input.attestation;

        let verified = (|| -> std::result::Result<Individual, ComputeError> {
            Ok(Individual {
                expected_salary: verify_u32(compute, input.expected_salary, att, origin)?,
                experience: verify_u32(compute, input.experience, att, origin)?,
                education: verify_u32(compute, input.education, att, origin)?,
                sex: verify_u32(compute, input.sex, att, origin)?,
                contact_email: verify_u256(compute, input.contact_email, att, origin)?,
                contact_phone: verify_u32(compute, input.contact_phone, att, origin)?,
                version: 0,
                exists: true,
            })
        })();

        verified.map_err(|e| {
            warn!("Rejected encrypted profile input from {}: {}", tx.sender, e);
            LedgerError::InvalidCiphertext(e)
        })
    }

    fn grant_profile_to_owner(&self, profile: &Individual, owner: Address) {
        for handle in [
            profile.expected_salary.handle(),
            profile.experience.handle(),
            profile.education.handle(),
            profile.sex.handle(),
            profile.contact_email.handle(),
            profile.contact_phone.handle(),
        ] {
            self.compute.allow(handle, owner);
        }
    }
}

fn company_from(input: CompanyInput, owner: Address) -> Company {
    Company {
        name: input.name,
        industry: input.industry,
        website: input.website,
        contact_email: input.contact_email,
        location: input.location,
        owner,
        exists: true,
    }
}
