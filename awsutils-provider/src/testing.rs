//! In-memory service fakes for handler tests
//!
//! Each fake records the calls it receives as `"<Operation> <args>"` strings
//! and shares its state between clones, so a test can keep one handle while
//! the handler owns another.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use awsutils_core::provider::{ProviderError, ProviderResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pgp::types::SecretKeyTrait;
use pgp::{
    Deserializable, KeyType, Message, SecretKeyParamsBuilder, SignedPublicKey, SignedSecretKey,
    SubkeyParamsBuilder,
};

use crate::conns::Services;
use crate::encryption::{EncryptionError, KeyResolver};
use crate::services::UnprocessedAccount;
use crate::services::ec2::api::Ec2Api;
use crate::services::guardduty::api::GuardDutyApi;
use crate::services::iam::api::{
    ENTITY_TEMPORARILY_UNMODIFIABLE, IamApi, LoginProfile, NO_SUCH_ENTITY,
};
use crate::services::macie2::api::Macie2Api;
use crate::services::securityhub::api::{ControlStatus, SecurityHubApi, StandardsControl};
use crate::services::sts::api::{Identity, StsApi};

fn failure(op: &str) -> ProviderError {
    ProviderError::new(format!("{} failed", op)).with_code("FakeFailure")
}

fn batch_call(op: &str, ids: &[String]) -> String {
    format!("{} [{}]", op, ids.join(", "))
}

#[derive(Default)]
struct Ec2State {
    default_vpc: Option<String>,
    internet_gateway: Option<String>,
    subnets: Vec<String>,
    client_vpn_configuration: Option<String>,
    failing_on: Option<String>,
    calls: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeEc2 {
    state: Arc<Mutex<Ec2State>>,
}

impl FakeEc2 {
    pub fn with_default_vpc(vpc_id: &str) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().default_vpc = Some(vpc_id.to_string());
        fake
    }

    pub fn with_internet_gateway(self, igw_id: &str) -> Self {
        self.state.lock().unwrap().internet_gateway = Some(igw_id.to_string());
        self
    }

    pub fn with_subnets(self, subnet_ids: &[&str]) -> Self {
        self.state.lock().unwrap().subnets = subnet_ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_client_vpn_configuration(self, configuration: &str) -> Self {
        self.state.lock().unwrap().client_vpn_configuration = Some(configuration.to_string());
        self
    }

    pub fn failing_on(self, op: &str) -> Self {
        self.state.lock().unwrap().failing_on = Some(op.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn call<T>(
        &self,
        op: &str,
        args: &[&str],
        f: impl FnOnce(&mut Ec2State) -> T,
    ) -> ProviderResult<T> {
        let mut state = self.state.lock().unwrap();
        let mut call = op.to_string();
        for arg in args {
            call.push(' ');
            call.push_str(arg);
        }
        state.calls.push(call);
        if state.failing_on.as_deref() == Some(op) {
            return Err(failure(op));
        }
        Ok(f(&mut state))
    }
}

#[async_trait]
impl Ec2Api for FakeEc2 {
    async fn find_default_vpc(&self) -> ProviderResult<Option<String>> {
        self.call("DescribeVpcs", &[], |s| s.default_vpc.clone())
    }

    async fn find_internet_gateway_for_vpc(&self, vpc_id: &str) -> ProviderResult<Option<String>> {
        self.call("DescribeInternetGateways", &[vpc_id], |s| s.internet_gateway.clone())
    }

    async fn detach_internet_gateway(&self, igw_id: &str, vpc_id: &str) -> ProviderResult<()> {
        self.call("DetachInternetGateway", &[igw_id, vpc_id], |_| ())
    }

    async fn delete_internet_gateway(&self, igw_id: &str) -> ProviderResult<()> {
        self.call("DeleteInternetGateway", &[igw_id], |s| s.internet_gateway = None)
    }

    async fn find_subnets_for_vpc(&self, vpc_id: &str) -> ProviderResult<Vec<String>> {
        self.call("DescribeSubnets", &[vpc_id], |s| s.subnets.clone())
    }

    async fn delete_subnet(&self, subnet_id: &str) -> ProviderResult<()> {
        self.call("DeleteSubnet", &[subnet_id], |s| s.subnets.retain(|id| id != subnet_id))
    }

    async fn delete_vpc(&self, vpc_id: &str) -> ProviderResult<()> {
        self.call("DeleteVpc", &[vpc_id], |s| s.default_vpc = None)
    }

    async fn export_client_vpn_client_configuration(
        &self,
        endpoint_id: &str,
    ) -> ProviderResult<Option<String>> {
        self.call("ExportClientVpnClientConfiguration", &[endpoint_id], |s| {
            s.client_vpn_configuration.clone()
        })
    }
}

#[derive(Clone)]
pub struct FakeSts {
    result: Result<Identity, String>,
    calls: Arc<Mutex<usize>>,
}

impl FakeSts {
    pub fn new(account_id: &str, arn: &str) -> Self {
        Self {
            result: Ok(Identity {
                account_id: account_id.to_string(),
                arn: arn.to_string(),
                user_id: "AIDAEXAMPLE".to_string(),
            }),
            calls: Arc::default(),
        }
    }

    pub fn failing(code: &str) -> Self {
        Self {
            result: Err(code.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl StsApi for FakeSts {
    async fn caller_identity(&self) -> ProviderResult<Identity> {
        *self.calls.lock().unwrap() += 1;
        self.result
            .clone()
            .map_err(|code| failure("GetCallerIdentity").with_code(code))
    }
}

#[derive(Default)]
struct BatchState {
    unprocessed: HashMap<String, Vec<UnprocessedAccount>>,
    calls: Vec<String>,
}

impl BatchState {
    fn record(&mut self, op: &str, call: String) -> Vec<UnprocessedAccount> {
        self.calls.push(call);
        self.unprocessed.get(op).cloned().unwrap_or_default()
    }

    fn add_unprocessed(&mut self, op: &str, account_id: &str, reason: &str) {
        self.unprocessed
            .entry(op.to_string())
            .or_default()
            .push(UnprocessedAccount {
                account_id: account_id.to_string(),
                reason: reason.to_string(),
            });
    }
}

#[derive(Clone, Default)]
pub struct FakeGuardDuty {
    state: Arc<Mutex<BatchState>>,
}

impl FakeGuardDuty {
    pub fn with_unprocessed(self, op: &str, account_id: &str, reason: &str) -> Self {
        self.state.lock().unwrap().add_unprocessed(op, account_id, reason);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, op: &str, detector_id: &str, ids: &[String]) -> Vec<UnprocessedAccount> {
        let call = batch_call(&format!("{} {}", op, detector_id), ids);
        self.state.lock().unwrap().record(op, call)
    }
}

#[async_trait]
impl GuardDutyApi for FakeGuardDuty {
    async fn create_members(
        &self,
        detector_id: &str,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>> {
        Ok(self.record("CreateMembers", detector_id, account_ids))
    }

    async fn disassociate_members(
        &self,
        detector_id: &str,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>> {
        Ok(self.record("DisassociateMembers", detector_id, account_ids))
    }

    async fn delete_members(
        &self,
        detector_id: &str,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>> {
        Ok(self.record("DeleteMembers", detector_id, account_ids))
    }
}

#[derive(Clone, Default)]
pub struct FakeMacie2 {
    failing_for: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeMacie2 {
    /// Every call for `account_id` fails
    pub fn failing_for(mut self, account_id: &str) -> Self {
        self.failing_for = Some(account_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &str, account_id: &str) -> ProviderResult<()> {
        self.calls.lock().unwrap().push(format!("{} {}", op, account_id));
        if self.failing_for.as_deref() == Some(account_id) {
            return Err(failure(op));
        }
        Ok(())
    }
}

#[async_trait]
impl Macie2Api for FakeMacie2 {
    async fn create_member(&self, account_id: &str) -> ProviderResult<()> {
        self.record("CreateMember", account_id)
    }

    async fn disassociate_member(&self, account_id: &str) -> ProviderResult<()> {
        self.record("DisassociateMember", account_id)
    }

    async fn delete_member(&self, account_id: &str) -> ProviderResult<()> {
        self.record("DeleteMember", account_id)
    }
}

struct SecurityHubState {
    subscriptions: Vec<(String, Vec<StandardsControl>)>,
    auto_enable: bool,
    batches: BatchState,
}

impl Default for SecurityHubState {
    fn default() -> Self {
        Self {
            subscriptions: Vec::new(),
            auto_enable: true,
            batches: BatchState::default(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeSecurityHub {
    state: Arc<Mutex<SecurityHubState>>,
}

impl FakeSecurityHub {
    /// Add an enabled standard with `(control arn, status, disabled reason)` controls
    pub fn with_subscription(
        self,
        subscription_arn: &str,
        controls: &[(&str, &str, Option<&str>)],
    ) -> Self {
        let controls = controls
            .iter()
            .map(|(arn, status, reason)| StandardsControl {
                arn: arn.to_string(),
                status: status.to_string(),
                disabled_reason: reason.map(str::to_string),
            })
            .collect();
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .push((subscription_arn.to_string(), controls));
        self
    }

    pub fn with_auto_enable(self, auto_enable: bool) -> Self {
        self.state.lock().unwrap().auto_enable = auto_enable;
        self
    }

    pub fn with_unprocessed(self, op: &str, account_id: &str, reason: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .batches
            .add_unprocessed(op, account_id, reason);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().batches.calls.clone()
    }

    /// Disabled reason currently stored on a control
    pub fn disabled_reason(&self, control_arn: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .subscriptions
            .iter()
            .flat_map(|(_, controls)| controls)
            .find(|c| c.arn == control_arn)
            .and_then(|c| c.disabled_reason.clone())
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().batches.calls.push(call.into());
    }

    fn batch(&self, op: &str, ids: &[String]) -> Vec<UnprocessedAccount> {
        self.state
            .lock()
            .unwrap()
            .batches
            .record(op, batch_call(op, ids))
    }
}

#[async_trait]
impl SecurityHubApi for FakeSecurityHub {
    async fn update_standards_control(
        &self,
        control_arn: &str,
        status: ControlStatus,
        disabled_reason: Option<&str>,
    ) -> ProviderResult<()> {
        let mut call = format!("UpdateStandardsControl {} {}", control_arn, status);
        if let Some(reason) = disabled_reason {
            call.push(' ');
            call.push_str(reason);
        }
        self.record(call);

        let mut state = self.state.lock().unwrap();
        for (_, controls) in state.subscriptions.iter_mut() {
            for control in controls.iter_mut().filter(|c| c.arn == control_arn) {
                control.status = status.to_string();
                control.disabled_reason = disabled_reason.map(str::to_string);
            }
        }
        Ok(())
    }

    async fn enabled_standards_subscriptions(&self) -> ProviderResult<Vec<String>> {
        self.record("GetEnabledStandards");
        let state = self.state.lock().unwrap();
        Ok(state.subscriptions.iter().map(|(arn, _)| arn.clone()).collect())
    }

    async fn describe_standards_controls(
        &self,
        subscription_arn: &str,
    ) -> ProviderResult<Vec<StandardsControl>> {
        self.record(format!("DescribeStandardsControls {}", subscription_arn));
        let state = self.state.lock().unwrap();
        Ok(state
            .subscriptions
            .iter()
            .find(|(arn, _)| arn == subscription_arn)
            .map(|(_, controls)| controls.clone())
            .unwrap_or_default())
    }

    async fn create_members(
        &self,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>> {
        Ok(self.batch("CreateMembers", account_ids))
    }

    async fn disassociate_members(&self, account_ids: &[String]) -> ProviderResult<()> {
        self.batch("DisassociateMembers", account_ids);
        Ok(())
    }

    async fn delete_members(
        &self,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>> {
        Ok(self.batch("DeleteMembers", account_ids))
    }

    async fn organization_auto_enable(&self) -> ProviderResult<bool> {
        self.record("DescribeOrganizationConfiguration");
        Ok(self.state.lock().unwrap().auto_enable)
    }

    async fn update_organization_configuration(&self, auto_enable: bool) -> ProviderResult<()> {
        self.record(format!("UpdateOrganizationConfiguration {}", auto_enable));
        self.state.lock().unwrap().auto_enable = auto_enable;
        Ok(())
    }
}

#[derive(Default)]
struct IamState {
    /// user name -> password
    profiles: HashMap<String, String>,
    invisible_reads: usize,
    unmodifiable_deletes: usize,
    calls: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeIam {
    state: Arc<Mutex<IamState>>,
}

impl FakeIam {
    pub fn with_profile(self, user_name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(user_name.to_string(), String::new());
        self
    }

    /// The next `reads` GetLoginProfile calls report NoSuchEntity
    pub fn invisible_for(self, reads: usize) -> Self {
        self.state.lock().unwrap().invisible_reads = reads;
        self
    }

    /// The next `attempts` DeleteLoginProfile calls report EntityTemporarilyUnmodifiable
    pub fn unmodifiable_for(self, attempts: usize) -> Self {
        self.state.lock().unwrap().unmodifiable_deletes = attempts;
        self
    }

    pub fn created_password(&self, user_name: &str) -> Option<String> {
        self.state.lock().unwrap().profiles.get(user_name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

fn no_such_entity(user_name: &str) -> ProviderError {
    ProviderError::new(format!("Login Profile for User {} cannot be found.", user_name))
        .with_code(NO_SUCH_ENTITY)
}

#[async_trait]
impl IamApi for FakeIam {
    async fn create_login_profile(
        &self,
        user_name: &str,
        password: &str,
        password_reset_required: bool,
    ) -> ProviderResult<LoginProfile> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("CreateLoginProfile {}", user_name));
        if state.profiles.contains_key(user_name) {
            return Err(failure("CreateLoginProfile").with_code("EntityAlreadyExists"));
        }
        state
            .profiles
            .insert(user_name.to_string(), password.to_string());
        Ok(LoginProfile {
            user_name: user_name.to_string(),
            password_reset_required,
        })
    }

    async fn get_login_profile(&self, user_name: &str) -> ProviderResult<LoginProfile> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("GetLoginProfile {}", user_name));
        if state.invisible_reads > 0 {
            state.invisible_reads -= 1;
            return Err(no_such_entity(user_name));
        }
        match state.profiles.contains_key(user_name) {
            true => Ok(LoginProfile {
                user_name: user_name.to_string(),
                password_reset_required: true,
            }),
            false => Err(no_such_entity(user_name)),
        }
    }

    async fn delete_login_profile(&self, user_name: &str) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("DeleteLoginProfile {}", user_name));
        if state.unmodifiable_deletes > 0 {
            state.unmodifiable_deletes -= 1;
            return Err(failure("DeleteLoginProfile").with_code(ENTITY_TEMPORARILY_UNMODIFIABLE));
        }
        match state.profiles.remove(user_name) {
            Some(_) => Ok(()),
            None => Err(no_such_entity(user_name)),
        }
    }
}

/// Fresh EdDSA signing key with a Curve25519 encryption subkey
pub fn pgp_key_pair() -> (SignedSecretKey, SignedPublicKey) {
    let subkey = SubkeyParamsBuilder::default()
        .key_type(KeyType::ECDH)
        .can_encrypt(true)
        .build()
        .unwrap();
    let params = SecretKeyParamsBuilder::default()
        .key_type(KeyType::EdDSA)
        .can_create_certificates(true)
        .can_sign(true)
        .primary_user_id("Ops <ops@example.com>".to_string())
        .subkey(subkey)
        .build()
        .unwrap();

    let secret = params.generate().unwrap().sign(String::new).unwrap();
    let public = secret.public_key().sign(&secret, String::new).unwrap();
    (secret, public)
}

/// Plaintext of a base64 message encrypted to `secret`
pub fn decrypt(secret: &SignedSecretKey, ciphertext: &str) -> String {
    let bytes = STANDARD.decode(ciphertext).unwrap();
    let message = Message::from_bytes(Cursor::new(bytes)).unwrap();
    let (mut decrypter, _) = message.decrypt(String::new, &[secret]).unwrap();
    let literal = decrypter.next().unwrap().unwrap();
    String::from_utf8(literal.get_content().unwrap().unwrap()).unwrap()
}

/// Hands out one generated key, or fails every lookup
#[derive(Clone)]
pub struct FakeKeyResolver {
    keys: Option<(SignedSecretKey, SignedPublicKey)>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeKeyResolver {
    pub fn new() -> Self {
        Self {
            keys: Some(pgp_key_pair()),
            requests: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            keys: None,
            requests: Arc::default(),
        }
    }

    pub fn public_key(&self) -> &SignedPublicKey {
        &self.keys.as_ref().unwrap().1
    }

    pub fn decrypt(&self, ciphertext: &str) -> String {
        decrypt(&self.keys.as_ref().unwrap().0, ciphertext)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyResolver for FakeKeyResolver {
    async fn resolve(&self, pgp_key: &str) -> Result<SignedPublicKey, EncryptionError> {
        self.requests.lock().unwrap().push(pgp_key.to_string());
        match &self.keys {
            Some((_, public)) => Ok(public.clone()),
            None => Err(EncryptionError::Keybase {
                user: pgp_key.trim_start_matches("keybase:").to_string(),
                message: "user not found".to_string(),
            }),
        }
    }
}

/// Services over fresh fakes, with the given STS
pub fn fake_services(sts: FakeSts) -> Services {
    Services {
        ec2: Arc::new(FakeEc2::default()),
        iam: Arc::new(FakeIam::default()),
        sts: Arc::new(sts),
        securityhub: Arc::new(FakeSecurityHub::default()),
        guardduty: Arc::new(FakeGuardDuty::default()),
        macie2: Arc::new(FakeMacie2::default()),
    }
}
