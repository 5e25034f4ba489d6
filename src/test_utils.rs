// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: scripted CLI responses, canned metadata and add-on
//! installers, and a mock Kubernetes API.

use crate::addons::{AddOn, AddOnInstaller, AddOnTarget};
use crate::command::{CommandOutput, CommandRunner, Invocation};
use crate::error::{ProvisionerError, Result};
use crate::network::InstanceMetadata;
use async_trait::async_trait;
use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

/// Dry-run output with a single managed node group
pub const BASELINE_SPEC: &str = r#"apiVersion: eksctl.io/v1alpha5
kind: ClusterConfig
metadata:
  name: demo1
  region: eu-west-1
  version: "1.30"
iam:
  withOIDC: false
vpc:
  clusterEndpoints:
    privateAccess: false
    publicAccess: true
  nat:
    gateway: Single
managedNodeGroups:
- name: ng-1
  amiFamily: AmazonLinux2
  instanceType: m5.large
  desiredCapacity: 3
  minSize: 3
  maxSize: 3
  volumeSize: 80
  privateNetworking: false
"#;

type CallHook = Box<dyn Fn(&Invocation) + Send + Sync>;

struct Rule {
    prefix: Vec<String>,
    responses: Mutex<VecDeque<CommandOutput>>,
}

impl Rule {
    fn next(&self) -> CommandOutput {
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap_or_default()
        }
    }
}

fn output(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

fn to_prefix(prefix: &[&str]) -> Vec<String> {
    prefix.iter().map(|p| p.to_string()).collect()
}

fn matches(invocation: &Invocation, prefix: &[String]) -> bool {
    let prefix: Vec<&str> = prefix.iter().map(String::as_str).collect();
    invocation.has_args_prefix(&prefix)
}

/// A [`CommandRunner`] answering from a script instead of spawning processes.
///
/// Rules match on an argument prefix; the first matching rule wins and
/// unmatched calls succeed with empty output. Every call is recorded.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    hooks: Vec<(Vec<String>, CallHook)>,
    holds: Vec<(Vec<String>, Vec<String>)>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, prefix: &[&str], code: i32, stdout: &str, stderr: &str) -> Self {
        self.on_sequence(prefix, vec![(code, stdout, stderr)])
    }

    /// Answer successive matching calls in order, repeating the last answer
    pub fn on_sequence(mut self, prefix: &[&str], responses: Vec<(i32, &str, &str)>) -> Self {
        self.rules.push(Rule {
            prefix: to_prefix(prefix),
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(code, stdout, stderr)| output(code, stdout, stderr))
                    .collect(),
            ),
        });
        self
    }

    /// Run `hook` on every matching call before it is answered
    pub fn on_call(
        mut self,
        prefix: &[&str],
        hook: impl Fn(&Invocation) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.push((to_prefix(prefix), Box::new(hook)));
        self
    }

    /// Hold matching calls until a call matching `until` has been recorded
    pub fn hold_until(mut self, prefix: &[&str], until: &[&str]) -> Self {
        self.holds.push((to_prefix(prefix), to_prefix(until)));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    fn seen(&self, prefix: &[String]) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .any(|call| matches(call, prefix))
    }

    async fn respond(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        for (prefix, until) in &self.holds {
            if !matches(invocation, prefix) {
                continue;
            }
            let released = tokio::time::timeout(Duration::from_secs(5), async {
                while !self.seen(until) {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            })
            .await;
            assert!(
                released.is_ok(),
                "`{}` held but {:?} never called",
                invocation.command_line(),
                until
            );
        }

        for (prefix, hook) in &self.hooks {
            if matches(invocation, prefix) {
                hook(invocation);
            }
        }

        Ok(self
            .rules
            .iter()
            .find(|rule| matches(invocation, &rule.prefix))
            .map(Rule::next)
            .unwrap_or_else(|| output(0, "", "")))
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.respond(invocation).await
    }

    async fn run_logged(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.respond(invocation).await
    }
}

/// Value of the `--kubeconfig` argument of a recorded call
pub fn kubeconfig_arg(invocation: &Invocation) -> Option<&str> {
    invocation
        .args
        .iter()
        .position(|a| a == "--kubeconfig")
        .and_then(|i| invocation.args.get(i + 1))
        .map(String::as_str)
}

/// `aws cloudformation describe-stack-resource` output
pub fn describe_resource_json(physical_id: &str) -> String {
    serde_json::json!({
        "StackResourceDetail": {
            "StackName": "eksctl-demo1-cluster",
            "LogicalResourceId": "ControlPlaneSecurityGroup",
            "PhysicalResourceId": physical_id,
            "ResourceType": "AWS::EC2::SecurityGroup",
            "ResourceStatus": "CREATE_COMPLETE"
        }
    })
    .to_string()
}

/// `eksctl get cluster -o json` output
pub fn cluster_json(cluster_id: &str) -> String {
    serde_json::json!([{
        "Name": cluster_id,
        "Status": "ACTIVE",
        "Version": "1.30",
        "Endpoint": format!("https://{}.gr7.eu-west-1.eks.amazonaws.com", cluster_id.to_uppercase()),
        "ResourcesVpcConfig": {
            "EndpointPrivateAccess": true,
            "EndpointPublicAccess": false
        }
    }])
    .to_string()
}

/// Kubeconfig as eksctl writes it for `cluster_id` in eu-west-1
pub fn kubeconfig_yaml(cluster_id: &str) -> String {
    let cluster = format!("{}.eu-west-1.eksctl.io", cluster_id);
    format!(
        r#"apiVersion: v1
clusters:
- cluster:
    certificate-authority-data: LS0tLS1CRUdJTg==
    server: https://{server}.gr7.eu-west-1.eks.amazonaws.com
  name: {cluster}
contexts:
- context:
    cluster: {cluster}
    user: admin@{cluster}
  name: admin@{cluster}
current-context: admin@{cluster}
kind: Config
preferences: {{}}
users:
- name: admin@{cluster}
  user:
    exec:
      apiVersion: client.authentication.k8s.io/v1beta1
      args:
      - eks
      - get-token
      - --output
      - json
      - --cluster-name
      - {id}
      - --region
      - eu-west-1
      command: aws
      env:
      - name: AWS_STS_REGIONAL_ENDPOINTS
        value: regional
      provideClusterInfo: false
"#,
        server = cluster_id.to_uppercase(),
        cluster = cluster,
        id = cluster_id
    )
}

/// [`InstanceMetadata`] returning a fixed address
pub struct StaticMetadata(IpAddr);

impl StaticMetadata {
    pub fn new(ip: &str) -> Self {
        Self(ip.parse().unwrap())
    }
}

#[async_trait]
impl InstanceMetadata for StaticMetadata {
    async fn private_ip(&self) -> Result<IpAddr> {
        Ok(self.0)
    }
}

/// [`AddOnInstaller`] recording what it was asked to install
#[derive(Default)]
pub struct RecordingAddOns {
    installed: Mutex<Vec<(AddOn, AddOnTarget)>>,
    failing: Vec<AddOn>,
}

impl RecordingAddOns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, addon: AddOn) -> Self {
        self.failing.push(addon);
        self
    }

    pub fn installed(&self) -> Vec<AddOn> {
        self.installed
            .lock()
            .unwrap()
            .iter()
            .map(|(addon, _)| *addon)
            .collect()
    }

    pub fn targets(&self) -> Vec<AddOnTarget> {
        self.installed
            .lock()
            .unwrap()
            .iter()
            .map(|(_, target)| target.clone())
            .collect()
    }
}

#[async_trait]
impl AddOnInstaller for RecordingAddOns {
    async fn ensure(&self, addon: AddOn, target: &AddOnTarget) -> Result<()> {
        self.installed
            .lock()
            .unwrap()
            .push((addon, target.clone()));
        if self.failing.contains(&addon) {
            return Err(ProvisionerError::Kubeconfig("connection refused".to_string()));
        }
        Ok(())
    }
}

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// Unmatched PATCH requests echo the submitted object back, as a server-side
/// apply would; other unmatched requests get a 404.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for PATCH requests whose path starts with `path`
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            ("PATCH".to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Method and path of every request received, in order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Query strings of every request received, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        responses
            .iter()
            .find(|((m, p), _)| m == method && path.starts_with(p.as_str()))
            .map(|(_, resp)| resp.clone())
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));
        self.queries
            .lock()
            .unwrap()
            .push(req.uri().query().unwrap_or_default().to_string());

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = match response {
                Some((status, body)) => (status, body.into_bytes()),
                None if method == "PATCH" => {
                    let submitted = match req.into_body().collect().await {
                        Ok(collected) => collected.to_bytes().to_vec(),
                        Err(_) => Vec::new(),
                    };
                    (200, submitted)
                }
                None => (
                    404,
                    status_json(404, "NotFound", "not found").into_bytes(),
                ),
            };
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap())
        })
    }
}

/// A `Status` object as returned by the API server on failure
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}
